use geo::Geometry;
use serde::{Deserialize, Serialize};

use super::geometry::Crs;

/// Where an AOI boundary came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AoiSource {
    /// Read from an external boundary file
    Supplied,
    /// Convex hull of member chip centroids
    Synthesized,
}

/// Area-of-interest boundary in the chips' projected CRS
///
/// Synthesized boundaries may be degenerate (a point or a line string) when
/// the AOI has fewer than three distinct centroid positions.
#[derive(Debug, Clone, PartialEq)]
pub struct AoiPolygon {
    pub aoi_id: String,
    pub name: String,
    pub boundary: Geometry<f64>,
    pub crs: Crs,
    pub source: AoiSource,
}
