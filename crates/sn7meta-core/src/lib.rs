//! SN7 Meta Core - Domain models, configuration, filename parsing and input readers
//!
//! This crate contains the core domain types shared by every sn7meta crate:
//! the parsed chip identifier, AOI and star-schema records, the error taxonomy
//! and the layered pipeline configuration.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod parse;

pub use error::{Result, Sn7Error};
pub use parse::parse_chip_filename;
