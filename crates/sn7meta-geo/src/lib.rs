//! SN7 Meta Geo - Tile math, reprojection and spatial operations
//!
//! This crate turns parsed chip identifiers into projected chip footprints,
//! reprojects AOI boundaries, synthesizes AOI hulls from chip centroids and
//! answers point-in-polygon queries over AOI boundaries.

pub mod hull;
pub mod resolver;
pub mod spatial;
pub mod tile;
pub mod transform;
pub mod validation;
pub mod encode;

pub use hull::build_aoi_polygons;
pub use resolver::TileGeometryResolver;
pub use spatial::AoiIndex;
pub use tile::{tile_to_lonlat_bounds, LonLatBounds};
