//! Star-schema rows handed to the persistence layer.
//!
//! Geometries are already encoded as well-known text together with their
//! SRID, so loaders bind them without re-encoding.

use serde::{Deserialize, Serialize};

/// `dim_aoi` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiDimension {
    pub aoi_id: String,
    pub name: String,
    pub geometry: String,
    pub srid: u32,
}

/// `dim_chip` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipDimension {
    pub chip_id: String,
    pub year: i32,
    pub month: u32,
    pub zoom: u32,
    pub tile_x: u32,
    pub tile_y: u32,
    pub utm_x: u32,
    pub utm_y: u32,
    pub utm_zone: u32,
    pub geometry: String,
    pub centroid: String,
    pub srid: u32,
}

/// `dim_time` row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeDimension {
    pub time_id: String,
    pub year: i32,
    pub month: u32,
}

/// `fact_chip_observation` row
///
/// `aoi_id` may reference an AOI with no `dim_aoi` row when the upstream
/// assignment found no boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipObservationFact {
    pub chip_id: String,
    pub aoi_id: Option<String>,
    pub time_id: String,
    pub building_id: i64,
    pub chip_geometry: String,
    pub centroid_geometry: String,
    pub aoi_geometry: Option<String>,
    pub srid: u32,
}

/// The four star-schema tables produced by one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StarSchema {
    pub dim_aoi: Vec<AoiDimension>,
    pub dim_chip: Vec<ChipDimension>,
    pub dim_time: Vec<TimeDimension>,
    pub facts: Vec<ChipObservationFact>,
}

impl StarSchema {
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}
