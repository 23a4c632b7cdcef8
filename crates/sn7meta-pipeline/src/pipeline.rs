use chrono::Utc;
use sn7meta_core::config::{PipelineConfig, RowErrorPolicy};
use sn7meta_core::error::{Result, Sn7Error};
use sn7meta_core::formats::AoiDataset;
use sn7meta_core::models::{Crs, PixelRecord};
use sn7meta_core::parse_chip_filename;
use sn7meta_geo::transform::aoi_polygons_from_dataset;
use sn7meta_geo::validation::validate_boundary;
use sn7meta_geo::{build_aoi_polygons, TileGeometryResolver};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::assign::{AoiAssigner, AoiCatalog, ResolvedChip};
use crate::models::{AoiSourceKind, BatchReport, PipelineOutput, RejectedRow};
use crate::schema::shape_star_schema;

/// Batch pipeline from pixel rows to star schema
///
/// Stages run strictly forward over immutable collections: parse and
/// resolve every row, build the AOI catalog, assign AOIs, then shape.
pub struct MetadataPipeline {
    config: PipelineConfig,
    resolver: TileGeometryResolver,
}

impl MetadataPipeline {
    /// Create a pipeline, validating the configuration eagerly
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let resolver = TileGeometryResolver::new(config.projection);
        Ok(Self { config, resolver })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one batch
    ///
    /// `boundaries` are supplied AOI boundaries; without them AOIs are
    /// synthesized from chip centroids unless synthesis is disabled.
    pub fn run(&mut self, rows: &[PixelRecord], boundaries: Option<&AoiDataset>) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(run_id = %run_id, rows = rows.len(), "Starting metadata pipeline");

        if rows.is_empty() {
            return Err(Sn7Error::EmptyResult { total: 0, rejected: 0 });
        }

        // Phase 1: parse filenames and resolve footprints
        let mut rejected = Vec::new();
        let mismatches_before = self.resolver.zone_mismatches();
        let chips = self.resolve_rows(rows, &mut rejected)?;
        let zone_mismatch_rows = self.resolver.zone_mismatches() - mismatches_before;
        tracing::info!(resolved = chips.len(), rejected = rejected.len(), "Resolved chip footprints");
        if zone_mismatch_rows > 0 {
            tracing::warn!(
                rows = zone_mismatch_rows,
                projection = ?self.config.projection,
                "Chips projected into a fixed zone other than their filename zone"
            );
        }

        // Phase 2: AOI boundaries in each chip CRS
        let (catalog, aoi_source) = self.build_catalog(&chips, boundaries)?;

        // Phase 3: AOI assignment
        let assigner = AoiAssigner::new(self.config.aoi_strategy, self.config.overlap_policy, catalog.as_ref());
        let mut records = Vec::with_capacity(chips.len());
        let mut accepted_rows = 0;
        for chip in &chips {
            match assigner.assign_one(chip) {
                Ok(assigned) => {
                    accepted_rows += 1;
                    records.extend(assigned);
                }
                Err(e) => self.reject(chip.row_index, &chip.filename, e, &mut rejected)?,
            }
        }
        rejected.sort_by_key(|r| r.row_index);

        if records.is_empty() {
            return Err(Sn7Error::EmptyResult { total: rows.len(), rejected: rejected.len() });
        }

        // Phase 4: dimensional shaping
        let schema = shape_star_schema(&records);

        let unassigned_rows = records.iter().filter(|r| r.aoi_geometry.is_none()).count();
        let report = BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            input_rows: rows.len(),
            accepted_rows,
            output_rows: records.len(),
            aoi_source,
            unassigned_rows,
            zone_mismatch_rows,
            rejected,
        };

        tracing::info!(
            run_id = %run_id,
            accepted = report.accepted_rows,
            rejected = report.rejected_rows(),
            unassigned = report.unassigned_rows,
            facts = schema.facts.len(),
            "Metadata pipeline finished"
        );

        Ok(PipelineOutput {
            records,
            aois: catalog.as_ref().map(AoiCatalog::all).unwrap_or_default(),
            schema,
            report,
        })
    }

    fn resolve_rows(&mut self, rows: &[PixelRecord], rejected: &mut Vec<RejectedRow>) -> Result<Vec<ResolvedChip>> {
        let mut chips = Vec::with_capacity(rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            let resolved = parse_chip_filename(&row.filename)
                .and_then(|chip| self.resolver.resolve(&chip).map(|geometry| (chip, geometry)));

            match resolved {
                Ok((chip, geometry)) => chips.push(ResolvedChip {
                    row_index,
                    filename: row.filename.clone(),
                    building_id: row.building_id,
                    chip,
                    geometry,
                }),
                Err(e) => self.reject(row_index, &row.filename, e, rejected)?,
            }
        }
        tracing::debug!(
            cached = self.resolver.cached(),
            cache_hits = self.resolver.cache_hits(),
            "Footprint cache"
        );
        Ok(chips)
    }

    /// Record a row-scoped failure, or propagate it under the abort policy
    fn reject(&self, row_index: usize, filename: &str, error: Sn7Error, rejected: &mut Vec<RejectedRow>) -> Result<()> {
        if !error.is_row_scoped() || self.config.row_error_policy == RowErrorPolicy::Abort {
            return Err(error);
        }
        tracing::warn!(row = row_index, filename, error = %error, "Rejected row");
        rejected.push(RejectedRow::new(row_index, filename, &error));
        Ok(())
    }

    fn build_catalog(
        &self,
        chips: &[ResolvedChip],
        boundaries: Option<&AoiDataset>,
    ) -> Result<(Option<AoiCatalog>, AoiSourceKind)> {
        let mut crs_in_use: BTreeMap<u32, Crs> = BTreeMap::new();
        for chip in chips {
            crs_in_use.entry(chip.geometry.crs.epsg).or_insert_with(|| chip.geometry.crs.clone());
        }

        let mut catalog = AoiCatalog::new();

        if let Some(dataset) = boundaries {
            for (epsg, crs) in &crs_in_use {
                let aois: Vec<_> = aoi_polygons_from_dataset(dataset, crs)?
                    .into_iter()
                    .filter(|aoi| {
                        let validation = validate_boundary(&aoi.boundary);
                        if !validation.is_valid {
                            tracing::warn!(aoi_id = %aoi.aoi_id, reason = %validation.summary(), "Skipping invalid AOI boundary");
                        }
                        validation.is_valid
                    })
                    .collect();
                catalog.extend(*epsg, aois);
            }
            tracing::info!(aois = dataset.features.len(), source = %dataset.name, "Using supplied AOI boundaries");
            return Ok((Some(catalog), AoiSourceKind::Supplied));
        }

        if !self.config.synthesize_aoi {
            let error = Sn7Error::MissingAoiSource {
                reason: "no boundary file given and AOI synthesis is disabled".to_string(),
            };
            tracing::warn!(error = %error, "AOI assignment will be absent");
            return Ok((None, AoiSourceKind::None));
        }

        for (epsg, crs) in &crs_in_use {
            let centroids = chips
                .iter()
                .filter(|c| c.geometry.crs.epsg == *epsg)
                .map(|c| (c.chip.aoi_id.as_str(), c.geometry.centroid));
            catalog.extend(*epsg, build_aoi_polygons(centroids, crs));
        }

        let distinct: HashSet<&str> = chips.iter().map(|c| c.chip.aoi_id.as_str()).collect();
        tracing::info!(aois = distinct.len(), "Synthesized AOI boundaries from chip centroids");
        Ok((Some(catalog), AoiSourceKind::Synthesized))
    }
}
