//! Tree command implementation
//!
//! @module cli/tree

use crate::cli::{open_analysis, GlobalArgs};
use crate::core::error::Result;
use crate::output::{human, json, OutputFormat};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the tree command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    strata tree                   Hierarchy of the current directory
    strata tree ./mypkg --json    Serialized tree dict")]
pub struct TreeArgs {
    /// Project path: a package directory or a single source file
    pub path: Option<PathBuf>,

    /// Print the serialized dict instead of the hierarchy
    #[arg(long)]
    pub json: bool,
}

/// Run the tree command
pub fn run(args: TreeArgs, global: &GlobalArgs) -> Result<()> {
    let analysis = open_analysis(args.path, global)?;

    let output = match OutputFormat::from_flag(args.json) {
        OutputFormat::Json => json::format(analysis.tree_dict()?),
        OutputFormat::Human => human::tree(analysis.tree()?),
    };
    println!("{}", output.trim_end());
    Ok(())
}
