use clap::{Args, Parser, Subcommand};
use sn7meta_core::config::{
    parse_aoi_strategy, parse_hemisphere, parse_overlap_policy, parse_projection_mode, parse_row_error_policy,
    AoiStrategy, CliConfigOverrides, OverlapPolicy, ProjectionMode, RowErrorPolicy,
};
use sn7meta_core::models::Hemisphere;
use std::path::PathBuf;

/// sn7meta - SpaceNet7 chip metadata pipeline
#[derive(Parser, Debug)]
#[command(name = "sn7meta")]
#[command(about = "Parse SpaceNet7 chip filenames, derive UTM chip geometry and load a PostGIS star schema", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML configuration file (defaults to ./sn7meta.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageBackend {
    /// In-memory storage (default, for development)
    Memory,
    /// PostgreSQL/PostGIS persistent storage
    Postgres,
}

/// Orphan AOI key handling for the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OrphanKeys {
    /// Store the fact with a NULL AOI key
    Nullify,
    /// Fail the load
    Reject,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline over a pixel CSV and load the star schema
    Ingest(IngestArgs),

    /// Parse chip filenames and print their fields
    Parse(ParseArgs),

    /// Show a tile's lon/lat bounds and UTM chip geometry
    Tile(TileArgs),

    /// Show the resolved configuration and where each value came from
    Config(ConfigArgs),
}

/// Pipeline settings shared by every command that resolves configuration
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// UTM zone number for the fixed projection (1-60)
    #[arg(long, value_name = "N")]
    pub utm_zone: Option<u32>,

    /// Hemisphere of the UTM zones (north or south)
    #[arg(long, value_parser = parse_hemisphere)]
    pub hemisphere: Option<Hemisphere>,

    /// Projection target: one fixed zone, or each chip's own zone (fixed or chip)
    #[arg(long, value_parser = parse_projection_mode)]
    pub projection: Option<ProjectionMode>,

    /// AOI join strategy (identifier or spatial)
    #[arg(long, value_parser = parse_aoi_strategy)]
    pub strategy: Option<AoiStrategy>,

    /// Multiple-AOI tie-break for the spatial join (first, all, or reject)
    #[arg(long, value_parser = parse_overlap_policy)]
    pub overlap: Option<OverlapPolicy>,

    /// Row error handling (skip or abort)
    #[arg(long = "on-row-error", value_parser = parse_row_error_policy)]
    pub on_row_error: Option<RowErrorPolicy>,

    /// Feature property holding the AOI identifier in boundary files
    #[arg(long, value_name = "NAME")]
    pub aoi_id_property: Option<String>,

    /// Do not synthesize AOI hulls when no boundary file is given
    #[arg(long)]
    pub no_synthesize_aoi: bool,
}

impl PipelineArgs {
    pub fn overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            utm_zone: self.utm_zone,
            hemisphere: self.hemisphere,
            projection: self.projection,
            aoi_strategy: self.strategy,
            overlap_policy: self.overlap,
            row_error_policy: self.on_row_error,
            synthesize_aoi: self.no_synthesize_aoi.then_some(false),
            aoi_id_property: self.aoi_id_property.clone(),
            ..Default::default()
        }
    }
}

#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Pixel ground-truth CSV (filename, id, geometry)
    #[arg(long, value_name = "PATH")]
    pub pixel_csv: Option<PathBuf>,

    /// AOI boundary file (GeoJSON or Shapefile)
    #[arg(long, value_name = "PATH")]
    pub aoi: Option<PathBuf>,

    /// Storage backend to load into
    #[arg(long, default_value = "memory")]
    pub storage: StorageBackend,

    /// PostgreSQL database URL (falls back to DATABASE_URL)
    #[arg(long, value_name = "URL", conflicts_with = "host")]
    pub database_url: Option<String>,

    /// PostgreSQL host
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL port
    #[arg(long, default_value_t = 5432)]
    pub port: u16,

    /// PostgreSQL user
    #[arg(long, default_value = "postgres")]
    pub user: String,

    /// PostgreSQL password
    #[arg(long)]
    pub password: Option<String>,

    /// PostgreSQL database name
    #[arg(long, default_value = "spacenet7")]
    pub dbname: String,

    /// Handling of fact AOI keys with no dim_aoi row
    #[arg(long, default_value = "nullify")]
    pub orphan_keys: OrphanKeys,

    /// Run the pipeline but do not load anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl IngestArgs {
    pub fn overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            pixel_csv: self.pixel_csv.clone(),
            aoi_path: self.aoi.clone(),
            ..self.pipeline.overrides()
        }
    }
}

#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Chip filenames
    #[arg(required = true)]
    pub filenames: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct TileArgs {
    /// Tile column
    pub x: u32,

    /// Tile row
    pub y: u32,

    /// Zoom level
    pub z: u32,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Pixel ground-truth CSV
    #[arg(long, value_name = "PATH")]
    pub pixel_csv: Option<PathBuf>,

    /// AOI boundary file
    #[arg(long, value_name = "PATH")]
    pub aoi: Option<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl ConfigArgs {
    pub fn overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            pixel_csv: self.pixel_csv.clone(),
            aoi_path: self.aoi.clone(),
            ..self.pipeline.overrides()
        }
    }
}
