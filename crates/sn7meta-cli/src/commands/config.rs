//! Config command implementation

use crate::cli::ConfigArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::ConfigEntry;
use anyhow::Result;
use std::path::Path;

pub fn execute(args: ConfigArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path, args.overrides())?;

    let entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source: format!("{:?}", source) })
        .collect();

    if output.is_json() {
        return output.result("success", &entries);
    }

    output.section("Resolved Configuration");
    output.table(entries);

    // Surface resolution errors without failing the inspection itself
    if let Err(e) = config.pipeline_config() {
        output.warning(format!("Configuration does not resolve: {}", e));
    }
    Ok(())
}
