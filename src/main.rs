//! Strata CLI entry point

use clap::Parser;
use strata::cli::{Cli, Commands};
use strata::core::error::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output
    if cli.global.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(EnvFilter::from_env("STRATA_LOG"))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_env("STRATA_LOG"))
            .init();
    }

    let global = &cli.global;
    match cli.command {
        Commands::Tree(args) => strata::cli::tree::run(args, global),
        Commands::Imports(args) => strata::cli::imports::run(args, global),
        Commands::Stats(args) => strata::cli::stats::run(args, global),
        Commands::Graph(args) => strata::cli::graph::run(args, global),
        Commands::Render(args) => strata::cli::render::run(args, global),
        Commands::Cache(args) => strata::cli::cache::run(args, global),
    }
}
