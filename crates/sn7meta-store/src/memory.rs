//! In-memory star-schema store for development, dry runs and tests.
//!
//! Mirrors the PostgreSQL adapter's semantics: dimension rows are keyed on
//! their natural key and never overwritten, facts are append-only with a
//! unique `(chip_id, time_id, building_id, aoi_id)` key.

use async_trait::async_trait;
use sn7meta_core::error::{Result, Sn7Error};
use sn7meta_core::models::{
    AoiDimension, ChipDimension, ChipObservationFact, StarSchema, TimeDimension,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::ports::{LoadReport, OrphanKeyPolicy, StarSchemaStore, TableCounts};

type FactKey = (String, String, i64, String);

#[derive(Debug, Default)]
struct Tables {
    dim_aoi: BTreeMap<String, AoiDimension>,
    dim_chip: BTreeMap<String, ChipDimension>,
    dim_time: BTreeMap<String, TimeDimension>,
    facts: Vec<ChipObservationFact>,
    fact_keys: HashSet<FactKey>,
}

fn fact_key(fact: &ChipObservationFact) -> FactKey {
    (
        fact.chip_id.clone(),
        fact.time_id.clone(),
        fact.building_id,
        fact.aoi_id.clone().unwrap_or_default(),
    )
}

fn conflict(reason: String) -> Sn7Error {
    Sn7Error::PersistenceConflict { table: "fact_chip_observation".to_string(), reason }
}

fn poisoned() -> Sn7Error {
    Sn7Error::Storage("memory store lock poisoned".to_string())
}

/// In-memory implementation of [`StarSchemaStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStarSchemaStore {
    tables: Arc<RwLock<Tables>>,
    orphan_policy: OrphanKeyPolicy,
}

impl MemoryStarSchemaStore {
    /// Create an empty store with the default orphan-key policy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orphan_policy(orphan_policy: OrphanKeyPolicy) -> Self {
        Self { orphan_policy, ..Self::default() }
    }

    /// Copy of everything stored so far, dimensions in key order
    pub fn snapshot(&self) -> Result<StarSchema> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(StarSchema {
            dim_aoi: tables.dim_aoi.values().cloned().collect(),
            dim_chip: tables.dim_chip.values().cloned().collect(),
            dim_time: tables.dim_time.values().cloned().collect(),
            facts: tables.facts.clone(),
        })
    }
}

#[async_trait]
impl StarSchemaStore for MemoryStarSchemaStore {
    async fn load(&self, schema: &StarSchema) -> Result<LoadReport> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let mut report = LoadReport::default();

        // Resolve every fact before touching the tables so a conflict
        // leaves the store unchanged
        let batch_aois: HashSet<&str> = schema.dim_aoi.iter().map(|d| d.aoi_id.as_str()).collect();
        let batch_chips: HashSet<&str> = schema.dim_chip.iter().map(|d| d.chip_id.as_str()).collect();
        let batch_times: HashSet<&str> = schema.dim_time.iter().map(|d| d.time_id.as_str()).collect();

        let mut pending = Vec::with_capacity(schema.facts.len());
        let mut pending_keys = HashSet::with_capacity(schema.facts.len());
        for fact in &schema.facts {
            if !batch_chips.contains(fact.chip_id.as_str()) && !tables.dim_chip.contains_key(&fact.chip_id) {
                return Err(conflict(format!("chip_id '{}' has no dim_chip row", fact.chip_id)));
            }
            if !batch_times.contains(fact.time_id.as_str()) && !tables.dim_time.contains_key(&fact.time_id) {
                return Err(conflict(format!("time_id '{}' has no dim_time row", fact.time_id)));
            }

            let mut fact = fact.clone();
            if let Some(aoi_id) = &fact.aoi_id {
                let known = batch_aois.contains(aoi_id.as_str()) || tables.dim_aoi.contains_key(aoi_id);
                if !known {
                    match self.orphan_policy {
                        OrphanKeyPolicy::Nullify => {
                            fact.aoi_id = None;
                            report.nullified_aoi_keys += 1;
                        }
                        OrphanKeyPolicy::Reject => {
                            return Err(conflict(format!("aoi_id '{}' has no dim_aoi row", aoi_id)));
                        }
                    }
                }
            }

            let key = fact_key(&fact);
            if tables.fact_keys.contains(&key) || !pending_keys.insert(key.clone()) {
                return Err(conflict(format!(
                    "duplicate observation (chip_id={}, time_id={}, building_id={})",
                    key.0, key.1, key.2
                )));
            }
            pending.push((key, fact));
        }

        for aoi in &schema.dim_aoi {
            let inserted = !tables.dim_aoi.contains_key(&aoi.aoi_id);
            if inserted {
                tables.dim_aoi.insert(aoi.aoi_id.clone(), aoi.clone());
            }
            report.record_aoi(inserted);
        }
        for chip in &schema.dim_chip {
            let inserted = !tables.dim_chip.contains_key(&chip.chip_id);
            if inserted {
                tables.dim_chip.insert(chip.chip_id.clone(), chip.clone());
            }
            report.record_chip(inserted);
        }
        for time in &schema.dim_time {
            let inserted = !tables.dim_time.contains_key(&time.time_id);
            if inserted {
                tables.dim_time.insert(time.time_id.clone(), time.clone());
            }
            report.record_time(inserted);
        }
        for (key, fact) in pending {
            tables.fact_keys.insert(key);
            tables.facts.push(fact);
            report.record_fact();
        }

        tracing::debug!(
            backend = "memory",
            inserted = report.total_inserted(),
            nullified = report.nullified_aoi_keys,
            "Loaded star schema"
        );
        Ok(report)
    }

    async fn counts(&self) -> Result<TableCounts> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(TableCounts {
            dim_aoi: tables.dim_aoi.len(),
            dim_chip: tables.dim_chip.len(),
            dim_time: tables.dim_time.len(),
            facts: tables.facts.len(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chip(chip_id: &str) -> ChipDimension {
        ChipDimension {
            chip_id: chip_id.to_string(),
            year: 2018,
            month: 1,
            zoom: 15,
            tile_x: 331,
            tile_y: 1257,
            utm_x: 1327,
            utm_y: 3160,
            utm_zone: 13,
            geometry: "POLYGON((0 0,1 0,1 1,0 1,0 0))".to_string(),
            centroid: "POINT(0.5 0.5)".to_string(),
            srid: 32613,
        }
    }

    fn fact(chip_id: &str, building_id: i64, aoi_id: Option<&str>) -> ChipObservationFact {
        ChipObservationFact {
            chip_id: chip_id.to_string(),
            aoi_id: aoi_id.map(str::to_string),
            time_id: "2018_01".to_string(),
            building_id,
            chip_geometry: "POLYGON((0 0,1 0,1 1,0 1,0 0))".to_string(),
            centroid_geometry: "POINT(0.5 0.5)".to_string(),
            aoi_geometry: None,
            srid: 32613,
        }
    }

    fn schema(facts: Vec<ChipObservationFact>) -> StarSchema {
        StarSchema {
            dim_aoi: vec![AoiDimension {
                aoi_id: "a".to_string(),
                name: "Alpha".to_string(),
                geometry: "POINT(0.5 0.5)".to_string(),
                srid: 32613,
            }],
            dim_chip: vec![chip("c1")],
            dim_time: vec![TimeDimension { time_id: "2018_01".to_string(), year: 2018, month: 1 }],
            facts,
        }
    }

    #[tokio::test]
    async fn test_dimension_inserts_are_idempotent() {
        let store = MemoryStarSchemaStore::new();

        let first = store.load(&schema(vec![fact("c1", 1, Some("a"))])).await.unwrap();
        assert_eq!(first.dim_aoi.inserted, 1);
        assert_eq!(first.facts.inserted, 1);

        let second = store.load(&schema(vec![fact("c1", 2, Some("a"))])).await.unwrap();
        assert_eq!(second.dim_aoi.skipped, 1);
        assert_eq!(second.dim_chip.skipped, 1);
        assert_eq!(second.dim_time.skipped, 1);
        assert_eq!(second.facts.inserted, 1);

        let counts = store.counts().await.unwrap();
        assert_eq!(counts, TableCounts { dim_aoi: 1, dim_chip: 1, dim_time: 1, facts: 2 });
    }

    #[tokio::test]
    async fn test_first_seen_dimension_wins() {
        let store = MemoryStarSchemaStore::new();
        store.load(&schema(vec![])).await.unwrap();

        let mut renamed = schema(vec![]);
        renamed.dim_aoi[0].name = "Renamed".to_string();
        store.load(&renamed).await.unwrap();

        assert_eq!(store.snapshot().unwrap().dim_aoi[0].name, "Alpha");
    }

    #[tokio::test]
    async fn test_fact_conflict_leaves_store_unchanged() {
        let store = MemoryStarSchemaStore::new();
        store.load(&schema(vec![fact("c1", 1, Some("a"))])).await.unwrap();

        let mut batch = schema(vec![fact("c1", 5, Some("a")), fact("c1", 1, Some("a"))]);
        batch.dim_chip.push(chip("c2"));
        let result = store.load(&batch).await;

        assert!(matches!(result, Err(Sn7Error::PersistenceConflict { .. })));
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.facts, 1);
        assert_eq!(counts.dim_chip, 1);
    }

    #[tokio::test]
    async fn test_duplicate_facts_within_batch_conflict() {
        let store = MemoryStarSchemaStore::new();
        let result = store.load(&schema(vec![fact("c1", 1, None), fact("c1", 1, None)])).await;
        assert!(matches!(result, Err(Sn7Error::PersistenceConflict { .. })));
    }

    #[tokio::test]
    async fn test_rows_differing_only_in_aoi_both_load() {
        let store = MemoryStarSchemaStore::new();
        let mut batch = schema(vec![fact("c1", 1, Some("a")), fact("c1", 1, Some("b"))]);
        batch.dim_aoi.push(AoiDimension {
            aoi_id: "b".to_string(),
            name: "Beta".to_string(),
            geometry: "POINT(0 0)".to_string(),
            srid: 32613,
        });

        let report = store.load(&batch).await.unwrap();
        assert_eq!(report.facts.inserted, 2);
    }

    #[tokio::test]
    async fn test_orphan_aoi_key_policies() {
        let nullify = MemoryStarSchemaStore::new();
        let report = nullify.load(&schema(vec![fact("c1", 1, Some("global_monthly_2018_02"))])).await.unwrap();
        assert_eq!(report.nullified_aoi_keys, 1);
        assert!(nullify.snapshot().unwrap().facts[0].aoi_id.is_none());

        let reject = MemoryStarSchemaStore::with_orphan_policy(OrphanKeyPolicy::Reject);
        let result = reject.load(&schema(vec![fact("c1", 1, Some("global_monthly_2018_02"))])).await;
        assert!(matches!(result, Err(Sn7Error::PersistenceConflict { .. })));
        assert_eq!(reject.counts().await.unwrap(), TableCounts::default());
    }

    #[tokio::test]
    async fn test_aoi_from_earlier_load_is_not_orphan() {
        let store = MemoryStarSchemaStore::with_orphan_policy(OrphanKeyPolicy::Reject);
        store.load(&schema(vec![])).await.unwrap();

        let mut later = schema(vec![fact("c1", 9, Some("a"))]);
        later.dim_aoi.clear();
        let report = store.load(&later).await.unwrap();
        assert_eq!(report.facts.inserted, 1);
        assert_eq!(report.nullified_aoi_keys, 0);
    }

    #[tokio::test]
    async fn test_missing_chip_dimension() {
        let store = MemoryStarSchemaStore::new();
        let result = store.load(&schema(vec![fact("unknown", 1, None)])).await;
        assert!(matches!(result, Err(Sn7Error::PersistenceConflict { .. })));
    }
}
