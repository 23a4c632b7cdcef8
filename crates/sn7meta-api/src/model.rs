//! Building-growth regression models
//!
//! Models are trained elsewhere; this service only evaluates them. The
//! linear model reads its coefficients from a JSON file of the form
//! `{"intercept": 0.4, "building_count": 0.9, "prev_building_count": -0.85}`.

use serde::{Deserialize, Serialize};
use sn7meta_core::error::{Result, Sn7Error};
use std::path::Path;

/// Inputs for one building-count delta prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaFeatures {
    pub building_count: f64,
    pub prev_building_count: f64,
}

/// A model predicting the change in building count between two months
pub trait DeltaModel: Send + Sync {
    fn predict(&self, features: &DeltaFeatures) -> f64;

    /// Predictions in input order
    fn predict_batch(&self, features: &[DeltaFeatures]) -> Vec<f64> {
        features.iter().map(|f| self.predict(f)).collect()
    }

    fn name(&self) -> &str;
}

/// Ordinary linear regression over the two building counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearDeltaModel {
    pub intercept: f64,
    pub building_count: f64,
    pub prev_building_count: f64,
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_name() -> String {
    "linear".to_string()
}

impl LinearDeltaModel {
    /// The plain difference `building_count - prev_building_count`
    pub fn difference_baseline() -> Self {
        Self {
            intercept: 0.0,
            building_count: 1.0,
            prev_building_count: -1.0,
            name: "difference-baseline".to_string(),
        }
    }

    /// Load coefficients from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)
            .map_err(|e| Sn7Error::Serialization(format!("{}: {}", path.display(), e)))?;

        tracing::info!(model = %model.name, path = %path.display(), "Loaded delta model");
        Ok(model)
    }
}

impl DeltaModel for LinearDeltaModel {
    fn predict(&self, features: &DeltaFeatures) -> f64 {
        self.intercept
            + self.building_count * features.building_count
            + self.prev_building_count * features.prev_building_count
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_difference_baseline() {
        let model = LinearDeltaModel::difference_baseline();
        let delta = model.predict(&DeltaFeatures { building_count: 50.0, prev_building_count: 45.0 });
        assert_eq!(delta, 5.0);
    }

    #[test]
    fn test_batch_preserves_order() {
        let model = LinearDeltaModel { intercept: 1.0, building_count: 2.0, prev_building_count: 0.0, name: "t".into() };
        let features = [
            DeltaFeatures { building_count: 3.0, prev_building_count: 0.0 },
            DeltaFeatures { building_count: 1.0, prev_building_count: 0.0 },
        ];
        assert_eq!(model.predict_batch(&features), vec![7.0, 3.0]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"intercept": 0.5, "building_count": 0.9, "prev_building_count": -0.8}}"#).unwrap();

        let model = LinearDeltaModel::from_path(file.path()).unwrap();
        assert_eq!(model.name(), "linear");
        assert_eq!(model.intercept, 0.5);
    }

    #[test]
    fn test_load_rejects_bad_files() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"intercept": 0.5}}"#).unwrap();
        assert!(matches!(LinearDeltaModel::from_path(file.path()), Err(Sn7Error::Serialization(_))));

        assert!(matches!(
            LinearDeltaModel::from_path(Path::new("/nonexistent/model.json")),
            Err(Sn7Error::Io(_))
        ));
    }
}
