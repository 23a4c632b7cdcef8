//! Chip footprint resolution
//!
//! A chip's footprint is the tile's lon/lat box reprojected into a UTM zone.
//! The polygon is the axis-aligned bounding box of the four reprojected
//! corners and the centroid is its centre.

use geo::{Coord, Rect};
use sn7meta_core::config::ProjectionTarget;
use sn7meta_core::error::{Result, Sn7Error};
use sn7meta_core::models::{ChipGeometry, Crs, ParsedChipIdentifier, UtmZone};
use std::collections::HashMap;

use crate::tile::{tile_to_lonlat_bounds, LonLatBounds};
use crate::transform::Reprojector;
use crate::validation::validate_chip_geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TileKey {
    zoom: u32,
    x: u32,
    y: u32,
    epsg: u32,
}

/// Resolves chip identifiers into projected footprints
///
/// PROJ transformations are built once per target zone and footprints are
/// cached per (tile, zoom, zone).
pub struct TileGeometryResolver {
    target: ProjectionTarget,
    projections: HashMap<u32, Reprojector>,
    cache: HashMap<TileKey, ChipGeometry>,
    hits: usize,
    zone_mismatches: usize,
}

impl TileGeometryResolver {
    pub fn new(target: ProjectionTarget) -> Self {
        Self { target, projections: HashMap::new(), cache: HashMap::new(), hits: 0, zone_mismatches: 0 }
    }

    /// Zone the given chip is projected into
    ///
    /// The filename zone is range-checked even when a fixed zone is configured.
    pub fn target_zone(&self, chip: &ParsedChipIdentifier) -> Result<UtmZone> {
        match self.target {
            ProjectionTarget::Fixed(zone) => {
                UtmZone::new(chip.utm_zone, zone.hemisphere())?;
                Ok(zone)
            }
            ProjectionTarget::ChipZone(hemisphere) => UtmZone::new(chip.utm_zone, hemisphere),
        }
    }

    /// Footprint and centroid of one chip
    ///
    /// Chips whose filename zone differs from a fixed target zone are still
    /// projected into the target zone and counted in [`Self::zone_mismatches`].
    pub fn resolve(&mut self, chip: &ParsedChipIdentifier) -> Result<ChipGeometry> {
        let zone = self.target_zone(chip)?;
        if zone.zone() != chip.utm_zone {
            self.zone_mismatches += 1;
            tracing::debug!(chip_id = %chip.chip_id, filename_zone = chip.utm_zone, target = %zone, "Chip projected outside its filename zone");
        }
        self.resolve_tile(chip.tile_x, chip.tile_y, chip.zoom, zone)
    }

    /// Footprint and centroid of tile `(x, y)` at `zoom` in `zone`
    pub fn resolve_tile(&mut self, x: u32, y: u32, zoom: u32, zone: UtmZone) -> Result<ChipGeometry> {
        let key = TileKey { zoom, x, y, epsg: zone.epsg() };
        if let Some(geometry) = self.cache.get(&key) {
            self.hits += 1;
            return Ok(geometry.clone());
        }

        let bounds = tile_to_lonlat_bounds(x, y, zoom)?;
        let reprojector = self.reprojector(zone)?;
        let geometry = project_bounds(&bounds, reprojector)?;

        let validation = validate_chip_geometry(&geometry);
        if !validation.is_valid {
            return Err(Sn7Error::Projection {
                from: Crs::wgs84().authority(),
                to: geometry.crs.authority(),
                reason: format!("tile ({}, {}, {}) produced an invalid footprint: {}", x, y, zoom, validation.summary()),
            });
        }

        tracing::debug!(x, y, zoom, epsg = zone.epsg(), "Resolved chip footprint");
        self.cache.insert(key, geometry.clone());
        Ok(geometry)
    }

    /// Number of footprints computed so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Number of lookups answered from the cache
    pub fn cache_hits(&self) -> usize {
        self.hits
    }

    /// Chips resolved into a fixed zone other than their filename zone
    pub fn zone_mismatches(&self) -> usize {
        self.zone_mismatches
    }

    fn reprojector(&mut self, zone: UtmZone) -> Result<&Reprojector> {
        let epsg = zone.epsg();
        if !self.projections.contains_key(&epsg) {
            let reprojector = Reprojector::new(&Crs::wgs84(), &zone.crs())?;
            self.projections.insert(epsg, reprojector);
        }
        self.projections.get(&epsg).ok_or_else(|| Sn7Error::Projection {
            from: Crs::wgs84().authority(),
            to: zone.crs().authority(),
            reason: "transformation cache miss".to_string(),
        })
    }
}

fn project_bounds(bounds: &LonLatBounds, reprojector: &Reprojector) -> Result<ChipGeometry> {
    let mut min = Coord { x: f64::INFINITY, y: f64::INFINITY };
    let mut max = Coord { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY };

    for (lon, lat) in bounds.corners() {
        let (x, y) = reprojector.convert(lon, lat)?;
        min.x = min.x.min(x);
        min.y = min.y.min(y);
        max.x = max.x.max(x);
        max.y = max.y.max(y);
    }

    let rect = Rect::new(min, max);
    Ok(ChipGeometry {
        polygon: rect.to_polygon(),
        centroid: rect.center().into(),
        crs: reprojector.target().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sn7meta_core::models::Hemisphere;
    use sn7meta_core::parse_chip_filename;

    const REFERENCE: &str = "global_monthly_2018_01_mosaic_L15-0331E-1257N_1327_3160_13";

    #[test]
    fn test_reference_tile_round_trip() {
        let zone = UtmZone::north(13).unwrap();
        let mut resolver = TileGeometryResolver::new(ProjectionTarget::ChipZone(Hemisphere::North));

        let geometry = resolver.resolve_tile(331, 1257, 15, zone).unwrap();
        assert_eq!(geometry.crs.epsg, 32613);

        let inverse = Reprojector::new(&zone.crs(), &Crs::wgs84()).unwrap();
        let (lon, lat) = inverse.convert(geometry.centroid.x(), geometry.centroid.y()).unwrap();

        let bounds = tile_to_lonlat_bounds(331, 1257, 15).unwrap();
        assert!(bounds.contains(lon, lat, 1e-6), "({}, {}) outside {:?}", lon, lat, bounds);
    }

    #[test]
    fn test_resolve_parsed_chip() {
        let chip = parse_chip_filename(REFERENCE).unwrap();
        let mut resolver = TileGeometryResolver::new(ProjectionTarget::ChipZone(Hemisphere::North));

        let geometry = resolver.resolve(&chip).unwrap();
        assert_eq!(geometry.polygon.exterior().0.len(), 5);
        assert!(validate_chip_geometry(&geometry).is_valid);
    }

    #[test]
    fn test_footprints_are_cached() {
        let chip = parse_chip_filename(REFERENCE).unwrap();
        let mut resolver = TileGeometryResolver::new(ProjectionTarget::ChipZone(Hemisphere::North));

        let first = resolver.resolve(&chip).unwrap();
        let second = resolver.resolve(&chip).unwrap();

        assert_eq!(first, second);
        assert_eq!(resolver.cached(), 1);
        assert_eq!(resolver.cache_hits(), 1);
    }

    #[test]
    fn test_fixed_zone_target() {
        let mut chip = parse_chip_filename(REFERENCE).unwrap();
        chip.utm_zone = 14;

        let fixed = UtmZone::north(13).unwrap();
        let mut resolver = TileGeometryResolver::new(ProjectionTarget::Fixed(fixed));

        assert_eq!(resolver.target_zone(&chip).unwrap(), fixed);
        assert_eq!(resolver.resolve(&chip).unwrap().crs.epsg, 32613);
        assert_eq!(resolver.zone_mismatches(), 1);

        // A chip already in the fixed zone is not counted
        resolver.resolve(&parse_chip_filename(REFERENCE).unwrap()).unwrap();
        assert_eq!(resolver.zone_mismatches(), 1);
    }

    #[test]
    fn test_southern_hemisphere() {
        let chip = parse_chip_filename(REFERENCE).unwrap();
        let mut resolver = TileGeometryResolver::new(ProjectionTarget::ChipZone(Hemisphere::South));
        assert_eq!(resolver.resolve(&chip).unwrap().crs.epsg, 32713);
    }

    #[test]
    fn test_unsupported_zone() {
        let mut chip = parse_chip_filename(REFERENCE).unwrap();
        chip.utm_zone = 61;

        let mut resolver = TileGeometryResolver::new(ProjectionTarget::Fixed(UtmZone::default()));
        assert!(matches!(resolver.resolve(&chip), Err(Sn7Error::UnsupportedZone { zone: 61 })));
    }

    #[test]
    fn test_invalid_tile_index() {
        let mut chip = parse_chip_filename(REFERENCE).unwrap();
        chip.zoom = 2;

        let mut resolver = TileGeometryResolver::new(ProjectionTarget::ChipZone(Hemisphere::North));
        assert!(matches!(resolver.resolve(&chip), Err(Sn7Error::InvalidTileIndex { .. })));
        assert_eq!(resolver.cached(), 0);
    }
}
