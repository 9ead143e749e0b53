//! Cache command implementation
//!
//! @module cli/cache

use crate::cli::{open_analysis, GlobalArgs};
use crate::core::error::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the cache command
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Delete the cached artifacts of a project
    Clear {
        /// Project path (default: current directory)
        path: Option<PathBuf>,
    },
}

/// Run the cache command
pub fn run(args: CacheArgs, global: &GlobalArgs) -> Result<()> {
    match args.action {
        CacheAction::Clear { path } => {
            // --no-cache would leave nothing to clear
            let global = GlobalArgs {
                no_cache: false,
                ..global.clone()
            };
            let analysis = open_analysis(path, &global)?;
            let removed = analysis.clear_cache()?;
            match analysis.cache_dir() {
                Some(dir) if removed > 0 => {
                    println!("Removed {} cached artifacts from {}", removed, dir.display())
                }
                _ => println!("No cached artifacts for: {}", analysis.project().root.display()),
            }
        }
    }
    Ok(())
}
