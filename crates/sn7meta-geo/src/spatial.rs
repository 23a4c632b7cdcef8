//! Point-in-polygon queries over AOI boundaries

use geo::{BoundingRect, Contains, Point};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use sn7meta_core::models::AoiPolygon;

type IndexedEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// R-tree over AOI bounding boxes
///
/// Entries carry the AOI's position in the slice the index was built from,
/// so query results come back in AOI table order.
pub struct AoiIndex<'a> {
    aois: &'a [AoiPolygon],
    tree: RTree<IndexedEnvelope>,
}

impl<'a> AoiIndex<'a> {
    /// Index a collection of AOIs
    pub fn new(aois: &'a [AoiPolygon]) -> Self {
        let entries: Vec<IndexedEnvelope> = aois
            .iter()
            .enumerate()
            .filter_map(|(idx, aoi)| {
                let rect = aoi.boundary.bounding_rect()?;
                let (min, max) = (rect.min(), rect.max());
                Some(GeomWithData::new(Rectangle::from_corners([min.x, min.y], [max.x, max.y]), idx))
            })
            .collect();

        Self { aois, tree: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Indices of every AOI whose boundary contains `point`, ascending
    ///
    /// Containment is strict: points on a boundary are not inside.
    pub fn containing(&self, point: &Point<f64>) -> Vec<usize> {
        let mut candidates: Vec<usize> = self
            .tree
            .locate_all_at_point(&[point.x(), point.y()])
            .map(|entry| entry.data)
            .collect();
        candidates.sort_unstable();

        candidates.into_iter().filter(|&idx| self.aois[idx].boundary.contains(point)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon, Geometry};
    use sn7meta_core::models::{AoiSource, Crs};

    fn square(aoi_id: &str, min: f64, max: f64) -> AoiPolygon {
        AoiPolygon {
            aoi_id: aoi_id.to_string(),
            name: aoi_id.to_string(),
            boundary: Geometry::Polygon(polygon![
                (x: min, y: min),
                (x: max, y: min),
                (x: max, y: max),
                (x: min, y: max),
            ]),
            crs: Crs::new(32613, "WGS 84 / UTM zone 13N"),
            source: AoiSource::Supplied,
        }
    }

    #[test]
    fn test_single_match() {
        let aois = vec![square("a", 0.0, 10.0), square("b", 20.0, 30.0)];
        let index = AoiIndex::new(&aois);

        assert_eq!(index.len(), 2);
        assert_eq!(index.containing(&point! { x: 5.0, y: 5.0 }), vec![0]);
        assert_eq!(index.containing(&point! { x: 25.0, y: 25.0 }), vec![1]);
        assert!(index.containing(&point! { x: 15.0, y: 15.0 }).is_empty());
    }

    #[test]
    fn test_overlaps_come_back_in_table_order() {
        let aois = vec![square("outer", 0.0, 100.0), square("mid", 10.0, 90.0), square("inner", 40.0, 60.0)];
        let index = AoiIndex::new(&aois);

        let hits = index.containing(&point! { x: 50.0, y: 50.0 });
        assert_eq!(hits, vec![0, 1, 2]);
        assert_eq!(aois[hits[2]].aoi_id, "inner");
    }

    #[test]
    fn test_bbox_hit_but_outside_polygon() {
        let triangle = AoiPolygon {
            boundary: Geometry::Polygon(polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 0.0, y: 10.0)]),
            ..square("t", 0.0, 1.0)
        };
        let aois = vec![triangle];
        let index = AoiIndex::new(&aois);

        assert_eq!(index.containing(&point! { x: 1.0, y: 1.0 }), vec![0]);
        assert!(index.containing(&point! { x: 9.0, y: 9.0 }).is_empty());
    }

    #[test]
    fn test_boundary_point_is_not_inside() {
        let aois = vec![square("a", 0.0, 10.0)];
        let index = AoiIndex::new(&aois);
        assert!(index.containing(&point! { x: 0.0, y: 5.0 }).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let aois: Vec<AoiPolygon> = Vec::new();
        let index = AoiIndex::new(&aois);
        assert!(index.is_empty());
        assert!(index.containing(&point! { x: 0.0, y: 0.0 }).is_empty());
    }
}
