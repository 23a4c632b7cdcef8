//! Well-known text encoding for persisted geometries

use ::wkt::ToWkt;
use geo::{Geometry, Point, Polygon};

/// WKT for any geometry
pub fn geometry_wkt(geometry: &Geometry<f64>) -> String {
    geometry.wkt_string()
}

pub fn polygon_wkt(polygon: &Polygon<f64>) -> String {
    polygon.wkt_string()
}

pub fn point_wkt(point: &Point<f64>) -> String {
    point.wkt_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};

    #[test]
    fn test_point_wkt() {
        let wkt = point_wkt(&point! { x: 1.5, y: -2.0 });
        assert!(wkt.starts_with("POINT"));
        assert!(wkt.contains("1.5 -2"));
    }

    #[test]
    fn test_polygon_wkt() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let wkt = polygon_wkt(&square);
        assert!(wkt.starts_with("POLYGON"));
        // Closed ring: first coordinate repeated
        assert_eq!(wkt.matches("0 0").count(), 2);
    }

    #[test]
    fn test_degenerate_geometry_wkt() {
        let line = Geometry::LineString(geo::LineString::from(vec![(0.0, 0.0), (2.0, 2.0)]));
        let wkt = geometry_wkt(&line);
        assert!(wkt.starts_with("LINESTRING"));
        assert!(wkt.contains("2 2"));
    }
}
