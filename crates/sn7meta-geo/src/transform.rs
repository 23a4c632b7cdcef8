//! CRS transformation

use geo::{Coord, Geometry, MapCoords};
use proj::Proj;
use sn7meta_core::error::{Result, Sn7Error};
use sn7meta_core::formats::AoiDataset;
use sn7meta_core::models::{AoiPolygon, AoiSource, Crs};

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.epsg == crs2.epsg
}

/// A PROJ transformation between two EPSG coordinate systems
///
/// Coordinates are always `(x, y)` = `(lon, lat)` or `(easting, northing)`.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    proj: Proj,
}

impl Reprojector {
    /// Build the transformation from `from` to `to`
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        let proj = Proj::new_known_crs(&from.authority(), &to.authority(), None).map_err(|e| {
            Sn7Error::Projection {
                from: from.authority(),
                to: to.authority(),
                reason: format!("Failed to create projection: {}", e),
            }
        })?;

        Ok(Self { from: from.clone(), to: to.clone(), proj })
    }

    pub fn source(&self) -> &Crs {
        &self.from
    }

    pub fn target(&self) -> &Crs {
        &self.to
    }

    /// Transform one coordinate pair
    pub fn convert(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let (tx, ty) = self.proj.convert((x, y)).map_err(|e| self.error(e))?;
        if !tx.is_finite() || !ty.is_finite() {
            return Err(self.error(format!("non-finite result for ({}, {})", x, y)));
        }
        Ok((tx, ty))
    }

    /// Transform every coordinate of a geometry
    pub fn reproject(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        geometry.try_map_coords(|coord| {
            self.convert(coord.x, coord.y).map(|(x, y)| Coord { x, y })
        })
    }

    fn error(&self, reason: impl ToString) -> Sn7Error {
        Sn7Error::Projection {
            from: self.from.authority(),
            to: self.to.authority(),
            reason: reason.to_string(),
        }
    }
}

/// Reproject supplied AOI boundaries into the chips' CRS
///
/// The name falls back to the identifier when the file has no `name`.
pub fn aoi_polygons_from_dataset(dataset: &AoiDataset, target: &Crs) -> Result<Vec<AoiPolygon>> {
    let source = Crs::new(dataset.crs, format!("EPSG:{}", dataset.crs));
    let reprojector = if crs_match(&source, target) {
        None
    } else {
        Some(Reprojector::new(&source, target)?)
    };

    dataset
        .features
        .iter()
        .map(|feature| {
            let boundary = match &reprojector {
                Some(r) => r.reproject(&feature.geometry)?,
                None => feature.geometry.clone(),
            };
            Ok(AoiPolygon {
                aoi_id: feature.aoi_id.clone(),
                name: feature.name.clone().unwrap_or_else(|| feature.aoi_id.clone()),
                boundary,
                crs: target.clone(),
                source: AoiSource::Supplied,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use sn7meta_core::formats::AoiFeature;
    use sn7meta_core::models::UtmZone;

    #[test]
    fn test_crs_match() {
        assert!(crs_match(&Crs::wgs84(), &Crs::new(4326, "anything")));
        assert!(!crs_match(&Crs::wgs84(), &UtmZone::north(13).unwrap().crs()));
    }

    #[test]
    fn test_same_crs_is_identity() {
        let geometry = Geometry::Polygon(polygon![(x: 1.5, y: 2.5), (x: 3.0, y: 2.5), (x: 3.0, y: 4.0)]);
        let dataset = AoiDataset {
            name: "aois".to_string(),
            format_name: "GeoJSON".to_string(),
            crs: 4326,
            features: vec![AoiFeature { aoi_id: "aoi-1".to_string(), name: None, geometry: geometry.clone() }],
        };

        let aois = aoi_polygons_from_dataset(&dataset, &Crs::wgs84()).unwrap();
        assert_eq!(aois[0].boundary, geometry);
    }

    #[test]
    fn test_central_meridian_maps_to_false_easting() {
        // Zone 13 central meridian is 105W
        let utm = UtmZone::north(13).unwrap().crs();
        let reprojector = Reprojector::new(&Crs::wgs84(), &utm).unwrap();

        let (easting, northing) = reprojector.convert(-105.0, 0.0).unwrap();
        assert!((easting - 500_000.0).abs() < 1e-3);
        assert!(northing.abs() < 1e-3);
    }

    #[test]
    fn test_round_trip() {
        let utm = UtmZone::north(13).unwrap().crs();
        let forward = Reprojector::new(&Crs::wgs84(), &utm).unwrap();
        let inverse = Reprojector::new(&utm, &Crs::wgs84()).unwrap();

        let (x, y) = forward.convert(-104.5, 32.25).unwrap();
        let (lon, lat) = inverse.convert(x, y).unwrap();
        assert!((lon + 104.5).abs() < 1e-9);
        assert!((lat - 32.25).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_crs() {
        let result = Reprojector::new(&Crs::wgs84(), &Crs::new(999_999, "bogus"));
        assert!(matches!(result, Err(Sn7Error::Projection { .. })));
    }

    #[test]
    fn test_aoi_polygons_from_dataset() {
        let dataset = AoiDataset {
            name: "aois".to_string(),
            format_name: "GeoJSON".to_string(),
            crs: 4326,
            features: vec![AoiFeature {
                aoi_id: "aoi-1".to_string(),
                name: None,
                geometry: Geometry::Polygon(polygon![
                    (x: -105.1, y: 32.0),
                    (x: -104.9, y: 32.0),
                    (x: -104.9, y: 32.2),
                    (x: -105.1, y: 32.2),
                ]),
            }],
        };

        let target = UtmZone::north(13).unwrap().crs();
        let aois = aoi_polygons_from_dataset(&dataset, &target).unwrap();

        assert_eq!(aois.len(), 1);
        assert_eq!(aois[0].name, "aoi-1");
        assert_eq!(aois[0].crs.epsg, 32613);
        assert_eq!(aois[0].source, AoiSource::Supplied);
        match &aois[0].boundary {
            Geometry::Polygon(p) => {
                assert!(p.exterior().coords().all(|c| c.x > 400_000.0 && c.x < 600_000.0));
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }
}
