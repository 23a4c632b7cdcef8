//! Tile command implementation

use crate::cli::TileArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::TileOutput;
use anyhow::{Context, Result};
use sn7meta_core::config::ProjectionTarget;
use sn7meta_core::models::UtmZone;
use sn7meta_geo::encode::{point_wkt, polygon_wkt};
use sn7meta_geo::{tile_to_lonlat_bounds, TileGeometryResolver};
use std::path::Path;

pub fn execute(args: TileArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path, args.pipeline.overrides())?;
    let zone = UtmZone::new(config.utm_zone.value, config.hemisphere.value).context("Invalid UTM zone")?;

    let bounds = tile_to_lonlat_bounds(args.x, args.y, args.z)?;
    let mut resolver = TileGeometryResolver::new(ProjectionTarget::Fixed(zone));
    let geometry = resolver.resolve_tile(args.x, args.y, args.z, zone)?;

    let tile = TileOutput {
        x: args.x,
        y: args.y,
        zoom: args.z,
        west: bounds.west,
        east: bounds.east,
        south: bounds.south,
        north: bounds.north,
        epsg: geometry.crs.epsg,
        polygon: polygon_wkt(&geometry.polygon),
        centroid: point_wkt(&geometry.centroid),
    };

    if output.is_json() {
        return output.result("success", &tile);
    }

    output.section(format!("Tile {}/{}/{}", tile.zoom, tile.x, tile.y));
    output.kv("Longitude", format!("{:.6} .. {:.6}", tile.west, tile.east));
    output.kv("Latitude", format!("{:.6} .. {:.6}", tile.south, tile.north));
    output.kv("CRS", format!("EPSG:{} ({})", tile.epsg, zone));
    output.kv("Polygon", &tile.polygon);
    output.kv("Centroid", &tile.centroid);
    Ok(())
}
