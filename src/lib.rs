//! Strata - structural model and import dependency analysis for Python codebases
//!
//! Rebuilds the directory → module → class → function hierarchy of a
//! project from raw source using tree-sitter offsets, enriches the import
//! relations found in it into a classified dependency table, and derives
//! statistics and PlantUML diagrams from both.

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod core;
pub mod diagram;
pub mod graph;
pub mod imports;
pub mod metrics;
pub mod output;
pub mod parse;
pub mod tree;

pub use analysis::Analysis;
pub use crate::core::config::Config;
pub use crate::core::error::{Error, Result};
pub use crate::core::project::Project;
pub use tree::{SourceTree, TreeBuilder};
