//! CLI command definitions and handlers

pub mod cache;
pub mod graph;
pub mod imports;
pub mod render;
pub mod stats;
pub mod tree;

use crate::analysis::Analysis;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::project::Project;
use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use tracing::info;

const LONG_ABOUT: &str = r#"
Structural model and import dependency analysis for Python codebases.

strata rebuilds the directory → module → class → function hierarchy of a
project from its source, classifies every import as internal, external or
builtin, and turns the result into statistics and PlantUML diagrams.

QUICK START:
    strata tree ./mypkg           Show the source hierarchy
    strata imports ./mypkg        Enriched import table
    strata stats ./mypkg          Dependency statistics
    strata graph ./mypkg          PlantUML module graphs on stdout
    strata render ./mypkg         Render diagrams through a PlantUML server

CACHING:
    Built artifacts are cached per project. Use --no-cache to bypass the
    cache for one run, or `strata cache clear` to drop it.

LOGGING:
    Set STRATA_LOG (e.g. STRATA_LOG=debug) to control log verbosity.
"#;

/// Structural model and import dependency analysis for Python codebases
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version)]
#[command(about = "Structural model and import dependency analysis for Python codebases")]
#[command(long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file (default: strata.toml in the project, then $STRATA_HOME/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Neither read nor write cached artifacts
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the source hierarchy
    Tree(tree::TreeArgs),

    /// Show the import relation table
    #[command(visible_alias = "i")]
    Imports(imports::ImportsArgs),

    /// Dependency statistics, rankings and unused/invalid imports
    Stats(stats::StatsArgs),

    /// Write PlantUML documents
    #[command(visible_alias = "g")]
    Graph(graph::GraphArgs),

    /// Render diagrams through the configured PlantUML server
    Render(render::RenderArgs),

    /// Manage cached artifacts
    Cache(cache::CacheArgs),
}

/// Project path (default: current directory)
fn project_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Ok(env::current_dir()?),
    }
}

/// Open an analysis session for the command's project
pub fn open_analysis(path: Option<PathBuf>, global: &GlobalArgs) -> Result<Analysis> {
    let project = Project::from_path(&project_path(path)?)?;
    info!(project = %project.name, root = %project.root.display(), "Analyzing project");

    let config = Config::load(global.config.as_deref(), project.config_dir())?;
    Analysis::new(project, config, !global.no_cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["strata", "stats", "pkg", "--no-cache", "--json"]).unwrap();
        assert!(cli.global.no_cache);
        match cli.command {
            Commands::Stats(args) => {
                assert!(args.json);
                assert_eq!(args.path, Some(PathBuf::from("pkg")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_graph_flags() {
        let cli = Cli::try_parse_from([
            "strata", "graph", "--external", "--classes", "--out", "docs",
        ])
        .unwrap();
        match cli.command {
            Commands::Graph(args) => {
                assert!(args.external && args.classes && !args.inheritance);
                assert_eq!(args.out, Some(PathBuf::from("docs")));
                assert_eq!(args.path, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cache_clear() {
        let cli = Cli::try_parse_from(["strata", "cache", "clear", "pkg"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cache(cache::CacheArgs {
                action: cache::CacheAction::Clear { .. }
            })
        ));
    }
}
