//! SN7 Meta Pipeline - AOI association and dimensional shaping
//!
//! [`MetadataPipeline`] runs the batch: parse filenames, resolve chip
//! footprints, assign AOIs and shape the enriched rows into a star schema,
//! reporting rejected rows alongside the result.

pub mod assign;
pub mod models;
pub mod pipeline;
pub mod schema;

pub use models::{AoiSourceKind, BatchReport, PipelineOutput, RejectedRow};
pub use pipeline::MetadataPipeline;
