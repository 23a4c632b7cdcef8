//! Geometry validation

use geo::{BoundingRect, Geometry, LineString, Polygon};
use sn7meta_core::models::ChipGeometry;

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: impl Into<String>, reason: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(ValidationError { location: location.into(), reason: reason.into() });
    }

    /// All error reasons joined into one line
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.location, e.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate a chip footprint: a closed quadrilateral with its centroid inside
pub fn validate_chip_geometry(chip: &ChipGeometry) -> ValidationResult {
    let mut result = ValidationResult::valid();
    let exterior = chip.polygon.exterior();

    check_finite(exterior, "Chip polygon", &mut result);

    // Four corners plus the closing coordinate
    if exterior.0.len() != 5 {
        result.add_error(
            "Chip polygon",
            format!("expected a quadrilateral with 5 coordinates, found {}", exterior.0.len()),
        );
    }
    if !exterior.is_closed() {
        result.add_error("Chip polygon", "exterior ring is not closed");
    }

    let centroid = chip.centroid;
    if !centroid.x().is_finite() || !centroid.y().is_finite() {
        result.add_error("Chip centroid", "coordinates must be finite");
    } else if let Some(rect) = chip.polygon.bounding_rect() {
        let (min, max) = (rect.min(), rect.max());
        if !(min.x < centroid.x() && centroid.x() < max.x && min.y < centroid.y() && centroid.y() < max.y) {
            result.add_error(
                "Chip centroid",
                format!("({}, {}) lies outside the polygon bounds", centroid.x(), centroid.y()),
            );
        }
    }

    result
}

/// Validate a supplied AOI boundary
///
/// Boundary files must carry areal geometry, so only polygons and
/// multipolygons pass.
pub fn validate_boundary(geometry: &Geometry<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    match geometry {
        Geometry::Polygon(polygon) => validate_polygon(polygon, "Polygon", &mut result),
        Geometry::MultiPolygon(mp) => {
            if mp.0.is_empty() {
                result.add_error("MultiPolygon", "contains no polygons");
            }
            for (i, polygon) in mp.0.iter().enumerate() {
                validate_polygon(polygon, &format!("MultiPolygon[{}]", i), &mut result);
            }
        }
        other => result.add_error(
            "Boundary",
            format!("expected Polygon or MultiPolygon, found {}", geometry_type(other)),
        ),
    }
    result
}

fn validate_polygon(polygon: &Polygon<f64>, location: &str, result: &mut ValidationResult) {
    let exterior = polygon.exterior();
    if exterior.0.len() < 4 {
        result.add_error(
            format!("{} exterior", location),
            format!("must have at least 4 points, found {}", exterior.0.len()),
        );
    }
    check_finite(exterior, location, result);

    for (i, interior) in polygon.interiors().iter().enumerate() {
        if interior.0.len() < 4 {
            result.add_error(
                format!("{} interior[{}]", location, i),
                format!("must have at least 4 points, found {}", interior.0.len()),
            );
        }
    }
}

fn check_finite(line: &LineString<f64>, location: &str, result: &mut ValidationResult) {
    for (i, coord) in line.0.iter().enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result.add_error(format!("{}[{}]", location, i), "coordinates must be finite");
        }
    }
}

fn geometry_type(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
