//! Command implementations

mod config;
mod ingest;
mod parse;
mod tile;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Ingest(args) => ingest::execute(args, config_path, &output).await,
        Commands::Parse(args) => parse::execute(args, &output),
        Commands::Tile(args) => tile::execute(args, config_path, &output),
        Commands::Config(args) => config::execute(args, config_path, &output),
    }
}
