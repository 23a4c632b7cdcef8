//! Slippy-map tile math
//!
//! Tiles are addressed by `(x, y)` at zoom `z` on a `2^z` by `2^z` grid in
//! Web Mercator, with `y` growing southwards.

use serde::{Deserialize, Serialize};
use sn7meta_core::error::{Result, Sn7Error};
use std::f64::consts::PI;

/// Highest zoom whose tile count still fits the tile-index range
pub const MAX_ZOOM: u32 = 31;

/// Geographic bounding box of one tile, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLatBounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl LonLatBounds {
    /// Geometric centre of the box
    pub fn center(&self) -> (f64, f64) {
        ((self.west + self.east) / 2.0, (self.south + self.north) / 2.0)
    }

    /// Whether `(lon, lat)` lies inside the box, widened by `tolerance` degrees
    pub fn contains(&self, lon: f64, lat: f64, tolerance: f64) -> bool {
        lon >= self.west - tolerance
            && lon <= self.east + tolerance
            && lat >= self.south - tolerance
            && lat <= self.north + tolerance
    }

    /// Corners in ring order: north-west, north-east, south-east, south-west
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.west, self.north),
            (self.east, self.north),
            (self.east, self.south),
            (self.west, self.south),
        ]
    }
}

/// Number of tiles along one axis at `zoom`
pub fn tile_count(zoom: u32) -> Result<u64> {
    if zoom > MAX_ZOOM {
        return Err(Sn7Error::UnsupportedZoom { zoom });
    }
    Ok(1u64 << zoom)
}

/// Geographic bounds of tile `(x, y)` at `zoom`
pub fn tile_to_lonlat_bounds(x: u32, y: u32, zoom: u32) -> Result<LonLatBounds> {
    let n = tile_count(zoom)?;
    if u64::from(x) >= n || u64::from(y) >= n {
        return Err(Sn7Error::InvalidTileIndex { x, y, zoom, n });
    }

    let n = n as f64;
    let lon = |col: f64| col / n * 360.0 - 180.0;
    let lat = |row: f64| (PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees();

    Ok(LonLatBounds {
        west: lon(f64::from(x)),
        east: lon(f64::from(x) + 1.0),
        north: lat(f64::from(y)),
        south: lat(f64::from(y) + 1.0),
    })
}
