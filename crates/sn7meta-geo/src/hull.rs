//! AOI boundary synthesis from chip centroids

use geo::{Area, ConvexHull, Coord, Geometry, LineString, MultiPoint, Point};
use sn7meta_core::models::{AoiPolygon, AoiSource, Crs};
use std::collections::BTreeMap;

/// Build one AOI boundary per AOI identifier from the convex hull of its
/// member centroids
///
/// Fewer than three distinct positions give a point or a line string, as do
/// collinear positions. Output is ordered by ascending `aoi_id`.
pub fn build_aoi_polygons<'a, I>(centroids: I, crs: &Crs) -> Vec<AoiPolygon>
where
    I: IntoIterator<Item = (&'a str, Point<f64>)>,
{
    let mut groups: BTreeMap<&str, Vec<Coord<f64>>> = BTreeMap::new();
    for (aoi_id, centroid) in centroids {
        let coords = groups.entry(aoi_id).or_default();
        let coord = centroid.0;
        if !coords.contains(&coord) {
            coords.push(coord);
        }
    }

    groups
        .into_iter()
        .map(|(aoi_id, coords)| AoiPolygon {
            aoi_id: aoi_id.to_string(),
            name: aoi_id.to_string(),
            boundary: hull_of(coords),
            crs: crs.clone(),
            source: AoiSource::Synthesized,
        })
        .collect()
}

fn hull_of(mut coords: Vec<Coord<f64>>) -> Geometry<f64> {
    match coords.len() {
        0 | 1 => Geometry::Point(Point(coords.pop().unwrap_or(Coord { x: 0.0, y: 0.0 }))),
        2 => Geometry::LineString(LineString::new(coords)),
        _ => {
            let hull = MultiPoint::from(coords.iter().copied().map(Point).collect::<Vec<_>>()).convex_hull();
            if hull.unsigned_area() > 0.0 {
                Geometry::Polygon(hull)
            } else {
                Geometry::LineString(extreme_segment(&coords))
            }
        }
    }
}

/// Segment between the two extreme positions of collinear points
fn extreme_segment(coords: &[Coord<f64>]) -> LineString<f64> {
    let key = |c: &&Coord<f64>| (c.x, c.y);
    let cmp = |a: &&Coord<f64>, b: &&Coord<f64>| key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal);

    let first = coords.iter().min_by(cmp).copied();
    let last = coords.iter().max_by(cmp).copied();
    match (first, last) {
        (Some(a), Some(b)) => LineString::new(vec![a, b]),
        _ => LineString::new(Vec::new()),
    }
}
