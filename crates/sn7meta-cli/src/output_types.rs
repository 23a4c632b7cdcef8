use serde::Serialize;
use sn7meta_core::models::ParsedChipIdentifier;
use sn7meta_pipeline::BatchReport;
use sn7meta_store::{LoadReport, TableLoad};
use tabled::Tabled;

/// Output for the ingest command
#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub report: BatchReport,
    pub dry_run: bool,
    pub backend: Option<String>,
    pub load: Option<LoadReport>,
}

/// Output for one filename of the parse command
#[derive(Debug, Serialize)]
pub struct ParseOutput {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedChipIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output for the tile command
#[derive(Debug, Serialize)]
pub struct TileOutput {
    pub x: u32,
    pub y: u32,
    pub zoom: u32,
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
    pub epsg: u32,
    pub polygon: String,
    pub centroid: String,
}

/// One configuration value and its source
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

#[derive(Tabled)]
pub struct ParsedRow {
    #[tabled(rename = "Chip")]
    pub chip_id: String,
    #[tabled(rename = "AOI")]
    pub aoi_id: String,
    #[tabled(rename = "Month")]
    pub month: String,
    #[tabled(rename = "Zoom")]
    pub zoom: u32,
    #[tabled(rename = "Tile")]
    pub tile: String,
    #[tabled(rename = "Zone")]
    pub utm_zone: u32,
}

impl From<&ParsedChipIdentifier> for ParsedRow {
    fn from(chip: &ParsedChipIdentifier) -> Self {
        Self {
            chip_id: chip.chip_id.clone(),
            aoi_id: chip.aoi_id.clone(),
            month: chip.time_id(),
            zoom: chip.zoom,
            tile: format!("{}E {}N", chip.tile_x, chip.tile_y),
            utm_zone: chip.utm_zone,
        }
    }
}

#[derive(Tabled)]
pub struct RejectedRowEntry {
    #[tabled(rename = "Row")]
    pub row: usize,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Error")]
    pub error: String,
}

#[derive(Tabled)]
pub struct TableLoadRow {
    #[tabled(rename = "Table")]
    pub table: &'static str,
    #[tabled(rename = "Inserted")]
    pub inserted: usize,
    #[tabled(rename = "Skipped")]
    pub skipped: usize,
}

impl TableLoadRow {
    pub fn rows(report: &LoadReport) -> Vec<Self> {
        let row = |table, load: &TableLoad| Self { table, inserted: load.inserted, skipped: load.skipped };
        vec![
            row("dim_aoi", &report.dim_aoi),
            row("dim_chip", &report.dim_chip),
            row("dim_time", &report.dim_time),
            row("fact_chip_observation", &report.facts),
        ]
    }
}
