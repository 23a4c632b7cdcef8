use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sn7meta_core::error::Result;
use sn7meta_core::models::StarSchema;

/// How a fact whose `aoi_id` has no `dim_aoi` row is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanKeyPolicy {
    /// Store the fact with a NULL AOI key
    #[default]
    Nullify,
    /// Fail the load with `PersistenceConflict`
    Reject,
}

/// Per-table outcome of one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLoad {
    pub inserted: usize,
    /// Rows already present under the same natural key
    pub skipped: usize,
}

impl TableLoad {
    fn record(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Outcome of loading one [`StarSchema`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub dim_aoi: TableLoad,
    pub dim_chip: TableLoad,
    pub dim_time: TableLoad,
    pub facts: TableLoad,
    /// Facts stored with a NULL AOI key under [`OrphanKeyPolicy::Nullify`]
    pub nullified_aoi_keys: usize,
}

impl LoadReport {
    pub fn record_aoi(&mut self, inserted: bool) {
        self.dim_aoi.record(inserted);
    }

    pub fn record_chip(&mut self, inserted: bool) {
        self.dim_chip.record(inserted);
    }

    pub fn record_time(&mut self, inserted: bool) {
        self.dim_time.record(inserted);
    }

    pub fn record_fact(&mut self) {
        self.facts.inserted += 1;
    }

    /// Total rows written across all four tables
    pub fn total_inserted(&self) -> usize {
        self.dim_aoi.inserted + self.dim_chip.inserted + self.dim_time.inserted + self.facts.inserted
    }
}

/// Row counts currently held by a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub dim_aoi: usize,
    pub dim_chip: usize,
    pub dim_time: usize,
    pub facts: usize,
}

/// Port for star-schema persistence
///
/// A load is atomic: dimension rows are inserted idempotently, facts are
/// append-only, and any fact conflict leaves the store unchanged.
#[async_trait]
pub trait StarSchemaStore: Send + Sync {
    /// Load the four tables of one batch
    async fn load(&self, schema: &StarSchema) -> Result<LoadReport>;

    /// Count the rows in each table
    async fn counts(&self) -> Result<TableCounts>;

    /// Short backend name for logs and reports
    fn backend_name(&self) -> &'static str;
}
