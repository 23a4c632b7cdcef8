//! Parse command implementation

use crate::cli::ParseArgs;
use crate::output::OutputWriter;
use crate::output_types::{ParseOutput, ParsedRow};
use anyhow::{bail, Result};
use sn7meta_core::parse_chip_filename;

pub fn execute(args: ParseArgs, output: &OutputWriter) -> Result<()> {
    let results: Vec<ParseOutput> = args
        .filenames
        .iter()
        .map(|filename| match parse_chip_filename(filename) {
            Ok(parsed) => ParseOutput { filename: filename.clone(), parsed: Some(parsed), error: None },
            Err(e) => ParseOutput { filename: filename.clone(), parsed: None, error: Some(e.to_string()) },
        })
        .collect();

    let failed = results.iter().filter(|r| r.error.is_some()).count();

    if output.is_json() {
        output.result(if failed == 0 { "success" } else { "error" }, &results)?;
    } else {
        output.table(results.iter().filter_map(|r| r.parsed.as_ref()).map(ParsedRow::from).collect::<Vec<_>>());
        for result in &results {
            if let Some(error) = &result.error {
                output.warning(error);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} filenames failed to parse", failed, results.len());
    }
    Ok(())
}
