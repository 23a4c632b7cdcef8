//! Ingest command implementation

use crate::cli::IngestArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{IngestOutput, RejectedRowEntry, TableLoadRow};
use crate::progress::{create_spinner, finish_error, finish_success};
use crate::storage::open_store;
use anyhow::{Context, Result};
use sn7meta_core::formats::{AoiReaderRegistry, PixelCsvReader};
use sn7meta_pipeline::MetadataPipeline;
use std::path::Path;

/// Rejected rows listed in human output before truncating
const REJECTED_PREVIEW: usize = 20;

pub async fn execute(args: IngestArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path, args.overrides())?;
    let pipeline_config = config.pipeline_config().context("Invalid pipeline configuration")?;
    let sources = config.source_config().context("Pass --pixel-csv or set SN7_PIXEL_CSV")?;

    // Phase 1: read inputs
    let spinner = create_spinner("Reading pixel CSV...", output.is_json());
    let rows = match PixelCsvReader.read_path(&sources.pixel_csv) {
        Ok(rows) => rows,
        Err(e) => {
            finish_error(&spinner, "Failed to read pixel CSV");
            return Err(e).with_context(|| format!("Failed to read {}", sources.pixel_csv.display()));
        }
    };
    finish_success(&spinner, &format!("Read {} rows from {}", rows.len(), sources.pixel_csv.display()));

    let boundaries = match &sources.aoi_path {
        Some(path) => {
            let spinner = create_spinner("Reading AOI boundaries...", output.is_json());
            let registry = AoiReaderRegistry::with_builtin_readers();
            let dataset = registry
                .read(path, &pipeline_config.aoi_id_property)
                .await
                .with_context(|| format!("Failed to read AOI boundaries from {}", path.display()))?;
            finish_success(&spinner, &format!("Read {} AOI boundaries ({})", dataset.features.len(), dataset.format_name));
            Some(dataset)
        }
        None => None,
    };

    // Phase 2: run the pipeline
    let spinner = create_spinner("Deriving chip geometry and AOIs...", output.is_json());
    let mut pipeline = MetadataPipeline::new(pipeline_config)?;
    let result = match pipeline.run(&rows, boundaries.as_ref()) {
        Ok(result) => result,
        Err(e) => {
            finish_error(&spinner, "Pipeline failed");
            return Err(e.into());
        }
    };
    finish_success(
        &spinner,
        &format!("Shaped {} facts from {} accepted rows", result.schema.facts.len(), result.report.accepted_rows),
    );

    // Phase 3: load
    let (backend, load) = if args.dry_run {
        (None, None)
    } else {
        let store = open_store(&args).await?;
        let spinner = create_spinner(&format!("Loading into {}...", store.backend_name()), output.is_json());
        let load = match store.load(&result.schema).await {
            Ok(load) => load,
            Err(e) => {
                finish_error(&spinner, "Load failed");
                return Err(e).context("Failed to load star schema");
            }
        };
        finish_success(&spinner, &format!("Inserted {} rows", load.total_inserted()));
        (Some(store.backend_name().to_string()), Some(load))
    };

    let report = result.report;

    if output.is_json() {
        return output.result("success", IngestOutput { report, dry_run: args.dry_run, backend, load });
    }

    output.section("Batch");
    output.kv("Run", report.run_id);
    output.kv("Input rows", report.input_rows);
    output.kv("Accepted rows", report.accepted_rows);
    output.kv("Output rows", report.output_rows);
    output.kv("Rejected rows", report.rejected_rows());
    output.kv("Unassigned rows", report.unassigned_rows);
    if report.zone_mismatch_rows > 0 {
        output.warning(format!(
            "{} chips were projected into a zone other than their filename zone (use --projection chip to keep each chip's zone)",
            report.zone_mismatch_rows
        ));
    }
    output.kv("AOI source", format!("{:?}", report.aoi_source));
    output.kv("Duration", format!("{} ms", report.duration_ms()));

    if !report.rejected.is_empty() {
        output.section("Rejected Rows");
        output.table(
            report
                .rejected
                .iter()
                .take(REJECTED_PREVIEW)
                .map(|r| RejectedRowEntry { row: r.row_index, kind: r.kind.clone(), error: r.error.clone() })
                .collect::<Vec<_>>(),
        );
        if report.rejected.len() > REJECTED_PREVIEW {
            output.info(format!("... and {} more (use --json for all)", report.rejected.len() - REJECTED_PREVIEW));
        }
    }

    match (backend, load) {
        (Some(backend), Some(load)) => {
            output.section(format!("Load ({})", backend));
            output.table(TableLoadRow::rows(&load));
            if load.nullified_aoi_keys > 0 {
                output.warning(format!("{} facts stored without an AOI key", load.nullified_aoi_keys));
            }
            output.success("Ingest complete");
        }
        _ => output.info("Dry run: nothing was loaded"),
    }

    Ok(())
}
