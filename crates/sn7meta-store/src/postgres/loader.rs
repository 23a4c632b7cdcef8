use async_trait::async_trait;
use sn7meta_core::error::{Result, Sn7Error};
use sn7meta_core::models::{ChipObservationFact, StarSchema};
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;

use super::PostgresStarSchemaStore;
use crate::ports::{LoadReport, OrphanKeyPolicy, StarSchemaStore, TableCounts};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn storage(action: &str, e: sqlx::Error) -> Sn7Error {
    Sn7Error::Storage(format!("Failed to {}: {}", action, e))
}

/// Map a fact insert failure, surfacing constraint violations as conflicts
fn fact_error(fact: &ChipObservationFact, e: sqlx::Error) -> Sn7Error {
    let code = e.as_database_error().and_then(|db| db.code()).map(|c| c.into_owned());
    match code.as_deref() {
        Some(UNIQUE_VIOLATION) => Sn7Error::PersistenceConflict {
            table: "fact_chip_observation".to_string(),
            reason: format!(
                "duplicate observation (chip_id={}, time_id={}, building_id={})",
                fact.chip_id, fact.time_id, fact.building_id
            ),
        },
        Some(FOREIGN_KEY_VIOLATION) => Sn7Error::PersistenceConflict {
            table: "fact_chip_observation".to_string(),
            reason: format!("missing dimension row for chip_id={}: {}", fact.chip_id, e),
        },
        _ => storage("insert fact", e),
    }
}

impl PostgresStarSchemaStore {
    async fn aoi_exists(tx: &mut Transaction<'_, Postgres>, aoi_id: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM dim_aoi WHERE aoi_id = $1)")
            .bind(aoi_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| storage("look up dim_aoi", e))
    }

    async fn insert_dimensions(
        tx: &mut Transaction<'_, Postgres>,
        schema: &StarSchema,
        report: &mut LoadReport,
    ) -> Result<()> {
        for aoi in &schema.dim_aoi {
            let result = sqlx::query(
                r#"
                INSERT INTO dim_aoi (aoi_id, name, geometry)
                VALUES ($1, $2, ST_GeomFromText($3, $4))
                ON CONFLICT (aoi_id) DO NOTHING
                "#,
            )
            .bind(&aoi.aoi_id)
            .bind(&aoi.name)
            .bind(&aoi.geometry)
            .bind(aoi.srid as i32)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage("insert dim_aoi", e))?;
            report.record_aoi(result.rows_affected() > 0);
        }

        for chip in &schema.dim_chip {
            let result = sqlx::query(
                r#"
                INSERT INTO dim_chip (chip_id, year, month, zoom, tile_x, tile_y, utm_x, utm_y, utm_zone, geometry, centroid)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, ST_GeomFromText($10, $12), ST_GeomFromText($11, $12))
                ON CONFLICT (chip_id) DO NOTHING
                "#,
            )
            .bind(&chip.chip_id)
            .bind(chip.year)
            .bind(chip.month as i32)
            .bind(chip.zoom as i32)
            .bind(chip.tile_x as i32)
            .bind(chip.tile_y as i32)
            .bind(chip.utm_x as i32)
            .bind(chip.utm_y as i32)
            .bind(chip.utm_zone as i32)
            .bind(&chip.geometry)
            .bind(&chip.centroid)
            .bind(chip.srid as i32)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage("insert dim_chip", e))?;
            report.record_chip(result.rows_affected() > 0);
        }

        for time in &schema.dim_time {
            let result = sqlx::query(
                r#"
                INSERT INTO dim_time (time_id, year, month)
                VALUES ($1, $2, $3)
                ON CONFLICT (time_id) DO NOTHING
                "#,
            )
            .bind(&time.time_id)
            .bind(time.year)
            .bind(time.month as i32)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage("insert dim_time", e))?;
            report.record_time(result.rows_affected() > 0);
        }

        Ok(())
    }

    async fn insert_facts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        facts: &[ChipObservationFact],
        report: &mut LoadReport,
    ) -> Result<()> {
        let mut known_aois: HashMap<String, bool> = HashMap::new();

        for fact in facts {
            let aoi_id = match &fact.aoi_id {
                Some(aoi_id) => {
                    let exists = match known_aois.get(aoi_id) {
                        Some(exists) => *exists,
                        None => {
                            let exists = Self::aoi_exists(tx, aoi_id).await?;
                            known_aois.insert(aoi_id.clone(), exists);
                            exists
                        }
                    };
                    match (exists, self.config.orphan_key_policy) {
                        (true, _) => Some(aoi_id.as_str()),
                        (false, OrphanKeyPolicy::Nullify) => {
                            report.nullified_aoi_keys += 1;
                            None
                        }
                        (false, OrphanKeyPolicy::Reject) => {
                            return Err(Sn7Error::PersistenceConflict {
                                table: "fact_chip_observation".to_string(),
                                reason: format!("aoi_id '{}' has no dim_aoi row", aoi_id),
                            });
                        }
                    }
                }
                None => None,
            };

            sqlx::query(
                r#"
                INSERT INTO fact_chip_observation
                    (chip_id, aoi_id, time_id, building_id, chip_geometry, centroid_geometry, aoi_geometry)
                VALUES ($1, $2, $3, $4, ST_GeomFromText($5, $8), ST_GeomFromText($6, $8), ST_GeomFromText($7, $8))
                "#,
            )
            .bind(&fact.chip_id)
            .bind(aoi_id)
            .bind(&fact.time_id)
            .bind(fact.building_id)
            .bind(&fact.chip_geometry)
            .bind(&fact.centroid_geometry)
            .bind(fact.aoi_geometry.as_deref())
            .bind(fact.srid as i32)
            .execute(&mut **tx)
            .await
            .map_err(|e| fact_error(fact, e))?;
            report.record_fact();
        }

        Ok(())
    }

    async fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage("count rows", e))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl StarSchemaStore for PostgresStarSchemaStore {
    async fn load(&self, schema: &StarSchema) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let mut tx = self.pool.begin().await.map_err(|e| storage("begin transaction", e))?;

        // Dimensions first so fact foreign keys resolve; any error drops
        // the transaction, which rolls it back
        Self::insert_dimensions(&mut tx, schema, &mut report).await?;
        self.insert_facts(&mut tx, &schema.facts, &mut report).await?;

        tx.commit().await.map_err(|e| storage("commit load", e))?;

        tracing::info!(
            backend = "postgres",
            dim_aoi = report.dim_aoi.inserted,
            dim_chip = report.dim_chip.inserted,
            dim_time = report.dim_time.inserted,
            facts = report.facts.inserted,
            nullified = report.nullified_aoi_keys,
            "Loaded star schema"
        );
        Ok(report)
    }

    async fn counts(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            dim_aoi: self.count("dim_aoi").await?,
            dim_chip: self.count("dim_chip").await?,
            dim_time: self.count("dim_time").await?,
            facts: self.count("fact_chip_observation").await?,
        })
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
