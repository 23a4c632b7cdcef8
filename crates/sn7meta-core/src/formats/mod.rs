//! Input readers
//!
//! The pixel ground-truth table is read with [`pixel_csv::PixelCsvReader`].
//! AOI boundary files go through the [`AoiReader`] trait; the
//! [`AoiReaderRegistry`] picks a reader by file extension.

use async_trait::async_trait;
use geo::Geometry;
use std::path::Path;

use crate::error::{Result, Sn7Error};

pub mod geojson;
pub mod pixel_csv;
pub mod shapefile;

pub use self::geojson::GeoJsonAoiReader;
pub use self::pixel_csv::PixelCsvReader;
pub use self::shapefile::ShapefileAoiReader;

/// EPSG code assumed when a boundary file declares no CRS
pub const DEFAULT_BOUNDARY_EPSG: u32 = 4326;

/// Reader for AOI boundary files
#[async_trait]
pub trait AoiReader: Send + Sync {
    /// Read every AOI feature from the given path
    ///
    /// `id_property` names the attribute holding the AOI identifier.
    async fn read(&self, path: &Path, id_property: &str) -> Result<AoiDataset>;

    /// Get supported file extensions (e.g., ["shp"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name
    fn format_name(&self) -> &str;
}

/// Boundaries read from one file, still in the file's CRS
#[derive(Debug, Clone)]
pub struct AoiDataset {
    pub name: String,
    pub format_name: String,
    /// EPSG code of the coordinates
    pub crs: u32,
    /// Features in file order
    pub features: Vec<AoiFeature>,
}

/// One AOI boundary feature
#[derive(Debug, Clone, PartialEq)]
pub struct AoiFeature {
    pub aoi_id: String,
    pub name: Option<String>,
    pub geometry: Geometry<f64>,
}

/// Registry of AOI boundary readers
pub struct AoiReaderRegistry {
    readers: Vec<Box<dyn AoiReader>>,
}

impl AoiReaderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry with the GeoJSON and Shapefile readers
    pub fn with_builtin_readers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GeoJsonAoiReader));
        registry.register(Box::new(ShapefileAoiReader));
        registry
    }

    /// Register a reader
    pub fn register(&mut self, reader: Box<dyn AoiReader>) {
        self.readers.push(reader);
    }

    /// Detect format and return the matching reader
    pub fn detect_format(&self, path: &Path) -> Result<&dyn AoiReader> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        self.readers
            .iter()
            .find(|r| r.supported_extensions().contains(&extension.as_str()))
            .map(|r| r.as_ref())
            .ok_or_else(|| Sn7Error::Format {
                format: "AOI boundary".to_string(),
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported extension '{}', expected one of: {}",
                    extension,
                    self.supported_formats().join(", ")
                ),
            })
    }

    /// Get list of all supported format extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    /// Detect the format of `path` and read it
    pub async fn read(&self, path: &Path, id_property: &str) -> Result<AoiDataset> {
        let reader = self.detect_format(path)?;
        let dataset = reader.read(path, id_property).await?;
        tracing::info!(
            path = %path.display(),
            format = reader.format_name(),
            crs = dataset.crs,
            features = dataset.features.len(),
            "Read AOI boundaries"
        );
        Ok(dataset)
    }
}

impl Default for AoiReaderRegistry {
    fn default() -> Self {
        Self::with_builtin_readers()
    }
}

/// Render a property value as an identifier string
pub(crate) fn property_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_detects_formats() {
        let registry = AoiReaderRegistry::with_builtin_readers();

        let reader = registry.detect_format(Path::new("aois.geojson")).unwrap();
        assert_eq!(reader.format_name(), "GeoJSON");

        let reader = registry.detect_format(Path::new("AOIS.SHP")).unwrap();
        assert_eq!(reader.format_name(), "Shapefile");
    }

    #[test]
    fn test_unsupported_extension() {
        let registry = AoiReaderRegistry::with_builtin_readers();
        let result = registry.detect_format(Path::new("aois.kml"));
        assert!(matches!(result, Err(Sn7Error::Format { .. })));
    }

    #[test]
    fn test_empty_registry() {
        let registry = AoiReaderRegistry::new();
        assert!(registry.supported_formats().is_empty());
        assert!(registry.detect_format(Path::new("aois.geojson")).is_err());
    }

    #[test]
    fn test_property_to_string() {
        assert_eq!(property_to_string(&serde_json::json!("L15-0331E")), Some("L15-0331E".into()));
        assert_eq!(property_to_string(&serde_json::json!(12)), Some("12".into()));
        assert_eq!(property_to_string(&serde_json::json!("  ")), None);
        assert_eq!(property_to_string(&serde_json::Value::Null), None);
    }
}
