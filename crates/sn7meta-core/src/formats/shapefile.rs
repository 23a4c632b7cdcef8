//! ESRI Shapefile AOI boundary reader
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj).
//! The CRS comes from the optional `.prj` sidecar.

use async_trait::async_trait;
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use regex::Regex;
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{Result, Sn7Error};
use crate::formats::{AoiDataset, AoiFeature, AoiReader, DEFAULT_BOUNDARY_EPSG};
use crate::models::{Hemisphere, UtmZone};

static ESRI_UTM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"PROJCS\["WGS_1984_UTM_Zone_(\d{1,2})([NS])""#).expect("ESRI UTM pattern is valid")
});

/// Shapefile format reader
pub struct ShapefileAoiReader;

#[async_trait]
impl AoiReader for ShapefileAoiReader {
    async fn read(&self, path: &Path, id_property: &str) -> Result<AoiDataset> {
        verify_components(path)?;

        let mut reader = shapefile::Reader::from_path(path)
            .map_err(|e| format_error(path, format!("Failed to open Shapefile: {}", e)))?;

        let crs = extract_crs(path)?;

        let mut features = Vec::new();
        for (idx, result) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = result
                .map_err(|e| format_error(path, format!("Failed to read feature {}: {}", idx, e)))?;

            let Some(aoi_id) = record_string(&record, id_property) else {
                tracing::warn!(feature = idx, property = id_property, "Skipping AOI feature without identifier");
                continue;
            };

            let geometry = shape_to_geometry(shape)
                .ok_or_else(|| format_error(path, format!("feature {} is not a polygon", idx)))?;

            features.push(AoiFeature { aoi_id, name: record_string(&record, "name"), geometry });
        }

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();

        Ok(AoiDataset { name, format_name: self.format_name().to_string(), crs, features })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }
}

fn format_error(path: &Path, reason: impl Into<String>) -> Sn7Error {
    Sn7Error::Format {
        format: "Shapefile".to_string(),
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Verify that all required Shapefile component files exist
fn verify_components(path: &Path) -> Result<()> {
    let base: PathBuf = path.with_extension("");
    let missing: Vec<String> = ["shp", "shx", "dbf"]
        .iter()
        .filter(|ext| !base.with_extension(ext).exists())
        .map(|ext| format!(".{}", ext))
        .collect();

    if !missing.is_empty() {
        return Err(format_error(
            path,
            format!("Missing required component files: {}", missing.join(", ")),
        ));
    }

    Ok(())
}

/// Extract the EPSG code from the `.prj` sidecar, defaulting to WGS 84
fn extract_crs(path: &Path) -> Result<u32> {
    let prj_path = path.with_extension("prj");
    if !prj_path.exists() {
        tracing::debug!(path = %path.display(), "No .prj file, assuming EPSG:{}", DEFAULT_BOUNDARY_EPSG);
        return Ok(DEFAULT_BOUNDARY_EPSG);
    }

    let prj = fs::read_to_string(&prj_path)
        .map_err(|e| format_error(path, format!("Failed to read .prj file: {}", e)))?;

    match epsg_from_prj(&prj) {
        Some(epsg) => Ok(epsg),
        None => {
            tracing::warn!(path = %prj_path.display(), "Unrecognised .prj, assuming EPSG:{}", DEFAULT_BOUNDARY_EPSG);
            Ok(DEFAULT_BOUNDARY_EPSG)
        }
    }
}

/// Parse an EPSG code out of OGC or ESRI WKT
fn epsg_from_prj(wkt: &str) -> Option<u32> {
    // The outermost AUTHORITY closes the definition
    const MARKER: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(start) = wkt.rfind(MARKER) {
        let code_start = start + MARKER.len();
        if let Some(end) = wkt[code_start..].find('"') {
            if let Ok(code) = wkt[code_start..code_start + end].parse::<u32>() {
                return Some(code);
            }
        }
    }

    if let Some(caps) = ESRI_UTM_NAME.captures(wkt) {
        let zone: u32 = caps[1].parse().ok()?;
        let hemisphere = if &caps[2] == "N" { Hemisphere::North } else { Hemisphere::South };
        return UtmZone::new(zone, hemisphere).ok().map(|zone| zone.epsg());
    }

    if wkt.starts_with("GEOGCS[\"GCS_WGS_1984\"") {
        return Some(4326);
    }

    None
}

fn record_string(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        FieldValue::Character(Some(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) => Some(format_number(*n)),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Double(d) => Some(format_number(*d)),
        _ => None,
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn shape_to_geometry(shape: Shape) -> Option<Geometry<f64>> {
    match shape {
        Shape::Polygon(polygon) => Some(rings_to_geometry(polygon.rings(), |p| (p.x, p.y))),
        Shape::PolygonM(polygon) => Some(rings_to_geometry(polygon.rings(), |p| (p.x, p.y))),
        Shape::PolygonZ(polygon) => Some(rings_to_geometry(polygon.rings(), |p| (p.x, p.y))),
        _ => None,
    }
}

/// Group rings into polygons; each inner ring belongs to the preceding outer ring
fn rings_to_geometry<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> (f64, f64)) -> Geometry<f64> {
    let to_line = |points: &[P]| -> LineString<f64> {
        points.iter().map(|p| {
            let (x, y) = xy(p);
            Coord { x, y }
        }).collect()
    };

    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => polygons.push((to_line(points), Vec::new())),
            PolygonRing::Inner(points) => match polygons.last_mut() {
                Some((_, holes)) => holes.push(to_line(points)),
                None => polygons.push((to_line(points), Vec::new())),
            },
        }
    }

    let mut polygons: Vec<Polygon<f64>> =
        polygons.into_iter().map(|(exterior, holes)| Polygon::new(exterior, holes)).collect();

    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(polygons))
    }
}
