//! GeoJSON AOI boundary reader

use async_trait::async_trait;
use geo::Geometry;
use std::path::Path;

use crate::error::{Result, Sn7Error};
use crate::formats::{property_to_string, AoiDataset, AoiFeature, AoiReader, DEFAULT_BOUNDARY_EPSG};

/// GeoJSON format reader
pub struct GeoJsonAoiReader;

#[async_trait]
impl AoiReader for GeoJsonAoiReader {
    async fn read(&self, path: &Path, id_property: &str) -> Result<AoiDataset> {
        let content = tokio::fs::read_to_string(path).await?;

        let geojson: geojson::GeoJson =
            content.parse().map_err(|e| format_error(path, format!("Failed to parse GeoJSON: {}", e)))?;

        let (features, crs) = match geojson {
            geojson::GeoJson::FeatureCollection(fc) => {
                // Legacy `crs` member; RFC 7946 files are always WGS 84
                let crs = fc
                    .foreign_members
                    .as_ref()
                    .and_then(|fm| fm.get("crs"))
                    .and_then(extract_epsg_from_crs)
                    .unwrap_or(DEFAULT_BOUNDARY_EPSG);
                (fc.features, crs)
            }
            geojson::GeoJson::Feature(feature) => (vec![feature], DEFAULT_BOUNDARY_EPSG),
            geojson::GeoJson::Geometry(_) => {
                return Err(format_error(
                    path,
                    "bare geometry has no properties to carry an AOI identifier",
                ))
            }
        };

        let mut aois = Vec::with_capacity(features.len());
        for (idx, feature) in features.iter().enumerate() {
            if let Some(aoi) = convert_feature(path, feature, idx, id_property)? {
                aois.push(aoi);
            }
        }

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();

        Ok(AoiDataset { name, format_name: self.format_name().to_string(), crs, features: aois })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

fn format_error(path: &Path, reason: impl Into<String>) -> Sn7Error {
    Sn7Error::Format {
        format: "GeoJSON".to_string(),
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Convert one feature, skipping those without an identifier or geometry
fn convert_feature(
    path: &Path,
    feature: &geojson::Feature,
    idx: usize,
    id_property: &str,
) -> Result<Option<AoiFeature>> {
    let Some(aoi_id) = feature.property(id_property).and_then(property_to_string) else {
        tracing::warn!(feature = idx, property = id_property, "Skipping AOI feature without identifier");
        return Ok(None);
    };

    let Some(geometry) = feature.geometry.as_ref() else {
        tracing::warn!(feature = idx, aoi_id = %aoi_id, "Skipping AOI feature without geometry");
        return Ok(None);
    };

    let geometry = Geometry::<f64>::try_from(geometry.value.clone())
        .map_err(|e| format_error(path, format!("feature {}: {}", idx, e)))?;

    let name = feature.property("name").and_then(property_to_string);

    Ok(Some(AoiFeature { aoi_id, name, geometry }))
}

/// Extract EPSG code from a legacy CRS object
///
/// Accepts `EPSG:32613` and `urn:ogc:def:crs:EPSG::32613`; OGC CRS84 maps to 4326.
fn extract_epsg_from_crs(crs: &serde_json::Value) -> Option<u32> {
    let name = crs.get("properties")?.get("name")?.as_str()?;
    if name.ends_with("CRS84") {
        return Some(DEFAULT_BOUNDARY_EPSG);
    }
    name.rsplit(':').next()?.parse().ok()
}
