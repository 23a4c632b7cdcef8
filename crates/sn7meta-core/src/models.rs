pub mod aoi;
pub mod chip;
pub mod geometry;
pub mod schema;

pub use aoi::{AoiPolygon, AoiSource};
pub use chip::{time_key, ChipGeometry, EnrichedChipRecord, ParsedChipIdentifier, PixelRecord};
pub use geometry::{Crs, Hemisphere, UtmZone};
pub use schema::{AoiDimension, ChipDimension, ChipObservationFact, StarSchema, TimeDimension};
