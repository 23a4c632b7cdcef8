//! Dimensional shaping
//!
//! Enriched rows become three deduplicated dimensions and one fact row per
//! enriched row. Dimensions keep the first-seen attributes for each natural
//! key; facts are never deduplicated.

use sn7meta_core::models::{
    time_key, AoiDimension, ChipDimension, ChipObservationFact, EnrichedChipRecord, StarSchema,
    TimeDimension,
};
use sn7meta_geo::encode::{geometry_wkt, point_wkt, polygon_wkt};
use std::collections::HashSet;

/// Shape enriched rows into the star schema
pub fn shape_star_schema(records: &[EnrichedChipRecord]) -> StarSchema {
    let mut schema = StarSchema::default();

    let mut seen_aoi = HashSet::new();
    let mut seen_chip = HashSet::new();
    let mut seen_time = HashSet::new();

    for record in records {
        let srid = record.geometry.crs.epsg;
        let chip = &record.chip;
        let chip_wkt = polygon_wkt(&record.geometry.polygon);
        let centroid_wkt = point_wkt(&record.geometry.centroid);
        let aoi_wkt = record.aoi_geometry.as_ref().map(geometry_wkt);

        if let (Some(aoi_id), Some(geometry)) = (&record.aoi_id, &aoi_wkt) {
            if seen_aoi.insert(aoi_id.clone()) {
                schema.dim_aoi.push(AoiDimension {
                    aoi_id: aoi_id.clone(),
                    name: record.aoi_name.clone().unwrap_or_else(|| aoi_id.clone()),
                    geometry: geometry.clone(),
                    srid,
                });
            }
        }

        if seen_chip.insert(chip.chip_id.clone()) {
            schema.dim_chip.push(ChipDimension {
                chip_id: chip.chip_id.clone(),
                year: chip.year,
                month: chip.month,
                zoom: chip.zoom,
                tile_x: chip.tile_x,
                tile_y: chip.tile_y,
                utm_x: chip.utm_x,
                utm_y: chip.utm_y,
                utm_zone: chip.utm_zone,
                geometry: chip_wkt.clone(),
                centroid: centroid_wkt.clone(),
                srid,
            });
        }

        let time_id = time_key(chip.year, chip.month);
        if seen_time.insert(time_id.clone()) {
            schema.dim_time.push(TimeDimension { time_id: time_id.clone(), year: chip.year, month: chip.month });
        }

        schema.facts.push(ChipObservationFact {
            chip_id: chip.chip_id.clone(),
            aoi_id: record.aoi_id.clone(),
            time_id,
            building_id: record.building_id,
            chip_geometry: chip_wkt,
            centroid_geometry: centroid_wkt,
            aoi_geometry: aoi_wkt,
            srid,
        });
    }

    tracing::debug!(
        dim_aoi = schema.dim_aoi.len(),
        dim_chip = schema.dim_chip.len(),
        dim_time = schema.dim_time.len(),
        facts = schema.facts.len(),
        "Shaped star schema"
    );

    schema
}
