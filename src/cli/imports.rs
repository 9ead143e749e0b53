//! Imports command implementation
//!
//! @module cli/imports

use crate::cli::{open_analysis, GlobalArgs};
use crate::core::error::Result;
use crate::output::{human, json, OutputFormat};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the imports command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    strata imports                Enriched import table
    strata imports --raw          Raw (module, import) rows
    strata imports --json         JSON output")]
pub struct ImportsArgs {
    /// Project path (default: current directory)
    pub path: Option<PathBuf>,

    /// Raw relation rows, before classification
    #[arg(long)]
    pub raw: bool,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

/// Run the imports command
pub fn run(args: ImportsArgs, global: &GlobalArgs) -> Result<()> {
    let analysis = open_analysis(args.path, global)?;
    let format = OutputFormat::from_flag(args.json);

    let output = if args.raw {
        let rows = analysis.import_rows()?;
        match format {
            OutputFormat::Json => json::format(rows),
            OutputFormat::Human => human::import_rows(rows),
        }
    } else {
        let rows = analysis.enriched_imports()?;
        match format {
            OutputFormat::Json => json::format(rows),
            OutputFormat::Human => human::enriched_imports(rows),
        }
    };
    println!("{}", output.trim_end());
    Ok(())
}
