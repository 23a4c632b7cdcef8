use serde::Deserialize;

use crate::error::ApiError;
use crate::model::DeltaFeatures;

/// One chip's building counts at two consecutive months
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    pub chip_id: String,
    pub building_count: f64,
    pub prev_building_count: f64,
}

impl PredictionRequest {
    /// Counts must be non-negative
    pub fn features(&self) -> Result<DeltaFeatures, ApiError> {
        for (field, value) in [("building_count", self.building_count), ("prev_building_count", self.prev_building_count)] {
            if value < 0.0 {
                return Err(ApiError::bad_request(format!("{} must be non-negative", field))
                    .with_details(format!("chip_id={}, {}={}", self.chip_id, field, value)));
            }
        }
        Ok(DeltaFeatures { building_count: self.building_count, prev_building_count: self.prev_building_count })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchPredictionRequest {
    pub records: Vec<PredictionRequest>,
}
