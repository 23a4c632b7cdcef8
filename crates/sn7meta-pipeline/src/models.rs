use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sn7meta_core::models::{AoiPolygon, EnrichedChipRecord, StarSchema};
use sn7meta_core::Sn7Error;
use uuid::Uuid;

/// Where the batch's AOI boundaries came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AoiSourceKind {
    /// External boundary file
    Supplied,
    /// Convex hulls of chip centroids
    Synthesized,
    /// No boundaries; AOI assignment is absent
    None,
}

/// An input row that did not make it into the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Position in the input table
    pub row_index: usize,
    pub filename: String,
    /// Error kind, e.g. `malformed_filename`
    pub kind: String,
    pub error: String,
}

impl RejectedRow {
    pub fn new(row_index: usize, filename: impl Into<String>, error: &Sn7Error) -> Self {
        Self {
            row_index,
            filename: filename.into(),
            kind: error.kind().to_string(),
            error: error.to_string(),
        }
    }
}

/// Batch-level summary returned with every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input_rows: usize,
    /// Input rows that produced at least one output row
    pub accepted_rows: usize,
    /// Output rows; exceeds `accepted_rows` only under the `all` overlap policy
    pub output_rows: usize,
    pub aoi_source: AoiSourceKind,
    /// Output rows that matched no AOI boundary
    pub unassigned_rows: usize,
    /// Rows projected into a fixed zone other than their filename zone
    pub zone_mismatch_rows: usize,
    pub rejected: Vec<RejectedRow>,
}

impl BatchReport {
    pub fn rejected_rows(&self) -> usize {
        self.rejected.len()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Everything one pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Enriched rows in input order
    pub records: Vec<EnrichedChipRecord>,
    /// AOI boundaries the rows were assigned against
    pub aois: Vec<AoiPolygon>,
    pub schema: StarSchema,
    pub report: BatchReport,
}
