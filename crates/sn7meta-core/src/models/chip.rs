//! Chip-level records: parsed identifiers, computed geometry and AOI enrichment.

use geo::{Geometry, Point, Polygon};
use serde::{Deserialize, Serialize};

use super::geometry::Crs;

/// Structured identifier parsed out of one SpaceNet7 chip filename
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedChipIdentifier {
    /// Mosaic segment, e.g. `global_monthly_2018_01`
    pub mosaic: String,
    pub year: i32,
    pub month: u32,
    /// Chip segment after `_mosaic_`, e.g. `L15-0331E-1257N_1327_3160_13`
    pub chip_id: String,
    pub zoom: u32,
    pub tile_x: u32,
    pub tile_y: u32,
    pub utm_x: u32,
    pub utm_y: u32,
    pub utm_zone: u32,
    /// AOI identifier; AOIs are mosaic-scoped
    pub aoi_id: String,
}

impl ParsedChipIdentifier {
    /// Composite time key for this chip's acquisition month
    pub fn time_id(&self) -> String {
        time_key(self.year, self.month)
    }
}

/// Time dimension key, `YYYY_MM`
pub fn time_key(year: i32, month: u32) -> String {
    format!("{}_{:02}", year, month)
}

/// One row of the pixel ground-truth table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelRecord {
    pub filename: String,
    /// Building observation identifier
    #[serde(rename = "id", alias = "building_id")]
    pub building_id: i64,
    /// Pixel-space building footprint, carried through untouched
    #[serde(default)]
    pub geometry: Option<String>,
}

/// Chip footprint and centroid in one projected CRS
#[derive(Debug, Clone, PartialEq)]
pub struct ChipGeometry {
    pub polygon: Polygon<f64>,
    pub centroid: Point<f64>,
    pub crs: Crs,
}

/// A chip row extended with its AOI assignment
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedChipRecord {
    /// Position of the source row in the input table
    pub row_index: usize,
    pub building_id: i64,
    pub chip: ParsedChipIdentifier,
    pub geometry: ChipGeometry,
    pub aoi_id: Option<String>,
    pub aoi_name: Option<String>,
    pub aoi_geometry: Option<Geometry<f64>>,
}
