//! SN7 Meta Store - Star-schema persistence port and adapters
//!
//! This crate defines the loader port for the four star-schema tables and
//! provides an in-memory adapter plus a PostgreSQL/PostGIS adapter.

pub mod memory;
pub mod ports;
pub mod postgres;

pub use memory::MemoryStarSchemaStore;
pub use ports::{LoadReport, OrphanKeyPolicy, StarSchemaStore, TableCounts, TableLoad};
pub use postgres::{PostgresConfig, PostgresStarSchemaStore};
