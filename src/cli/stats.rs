//! Stats command implementation
//!
//! @module cli/stats

use crate::cli::{open_analysis, GlobalArgs};
use crate::core::error::Result;
use crate::output::{human, json, OutputFormat};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Project path (default: current directory)
    pub path: Option<PathBuf>,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

/// Run the stats command
pub fn run(args: StatsArgs, global: &GlobalArgs) -> Result<()> {
    let analysis = open_analysis(args.path, global)?;
    let report = analysis.report()?;

    let output = match OutputFormat::from_flag(args.json) {
        OutputFormat::Json => json::format(&report),
        OutputFormat::Human => human::report(&report),
    };
    println!("{}", output.trim_end());
    Ok(())
}
