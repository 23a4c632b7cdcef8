//! Error types for the SpaceNet7 metadata pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Sn7Error {
    // Row-scoped parsing and geometry errors
    #[error("Malformed chip filename '{filename}': {reason}")]
    MalformedFilename { filename: String, reason: String },

    #[error("Unsupported UTM zone {zone}: expected 1-60")]
    UnsupportedZone { zone: u32 },

    #[error("Invalid tile index ({x}, {y}) at zoom {zoom}: expected values in [0, {n})")]
    InvalidTileIndex { x: u32, y: u32, zoom: u32, n: u64 },

    #[error("Unsupported zoom level {zoom}: tile grid exceeds the tile index range")]
    UnsupportedZoom { zoom: u32 },

    #[error("Projection from {from} to {to} failed: {reason}")]
    Projection {
        from: String,
        to: String,
        reason: String,
    },

    // AOI association errors
    #[error("No AOI source available: {reason}")]
    MissingAoiSource { reason: String },

    #[error("Chip centroid is covered by {count} AOIs ({aoi_ids}); overlap policy is 'reject'")]
    AmbiguousAoi { count: usize, aoi_ids: String },

    // Batch errors
    #[error("Batch produced no rows: {total} input rows, {rejected} rejected")]
    EmptyResult { total: usize, rejected: usize },

    // Persistence errors
    #[error("Persistence conflict on {table}: {reason}")]
    PersistenceConflict { table: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    // Input format errors
    #[error("{format} error in {path}: {reason}")]
    Format {
        format: String,
        path: PathBuf,
        reason: String,
    },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Sn7Error {
    /// Build a `MalformedFilename` error for the given input
    pub fn malformed(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Sn7Error::MalformedFilename { filename: filename.into(), reason: reason.into() }
    }

    /// Whether the error is confined to a single input row
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            Sn7Error::MalformedFilename { .. }
                | Sn7Error::UnsupportedZone { .. }
                | Sn7Error::InvalidTileIndex { .. }
                | Sn7Error::UnsupportedZoom { .. }
                | Sn7Error::Projection { .. }
                | Sn7Error::AmbiguousAoi { .. }
        )
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Sn7Error::MalformedFilename { .. } => "malformed_filename",
            Sn7Error::UnsupportedZone { .. } => "unsupported_zone",
            Sn7Error::InvalidTileIndex { .. } => "invalid_tile_index",
            Sn7Error::UnsupportedZoom { .. } => "unsupported_zoom",
            Sn7Error::Projection { .. } => "projection",
            Sn7Error::MissingAoiSource { .. } => "missing_aoi_source",
            Sn7Error::AmbiguousAoi { .. } => "ambiguous_aoi",
            Sn7Error::EmptyResult { .. } => "empty_result",
            Sn7Error::PersistenceConflict { .. } => "persistence_conflict",
            Sn7Error::Storage(_) => "storage",
            Sn7Error::Format { .. } => "format",
            Sn7Error::ConfigMissing { .. } => "config_missing",
            Sn7Error::ConfigInvalid { .. } => "config_invalid",
            Sn7Error::Io(_) => "io",
            Sn7Error::Serialization(_) => "serialization",
        }
    }
}

pub type Result<T> = std::result::Result<T, Sn7Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_scoped_errors() {
        assert!(Sn7Error::malformed("x", "no separator").is_row_scoped());
        assert!(Sn7Error::UnsupportedZone { zone: 61 }.is_row_scoped());
        assert!(!Sn7Error::EmptyResult { total: 0, rejected: 0 }.is_row_scoped());
        assert!(!Sn7Error::ConfigMissing { key: "pixel_csv".into() }.is_row_scoped());
    }

    #[test]
    fn test_error_messages() {
        let err = Sn7Error::InvalidTileIndex { x: 4, y: 0, zoom: 2, n: 4 };
        assert_eq!(err.to_string(), "Invalid tile index (4, 0) at zoom 2: expected values in [0, 4)");
        assert_eq!(err.kind(), "invalid_tile_index");
    }
}
