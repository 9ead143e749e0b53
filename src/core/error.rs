//! Error types for strata

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using strata's Error
pub type Result<T> = std::result::Result<T, Error>;

/// strata error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Source path not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Segment boundaries reported by the syntax analyzer fall outside the text.
    /// Signals a builder bug, never malformed input.
    #[error("Offset mismatch: lines {start_line}..={end_line} requested from a {line_count}-line segment")]
    OffsetMismatch {
        start_line: usize,
        end_line: usize,
        line_count: usize,
    },

    #[error("Syntax node `{kind}` is not a compound statement")]
    NotCompoundStatement { kind: String },

    #[error("Branches of node `{name}` are already set")]
    BranchesAlreadySet { name: String },

    #[error("Module names don't share a single project root (found: {})", roots.join(", "))]
    MultipleProjectRoots { roots: Vec<String> },

    #[error("Invalid tree dict: {message}")]
    InvalidTreeDict { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Syntax analyzer error: {message}")]
    SyntaxError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<tree_sitter::LanguageError> for Error {
    fn from(e: tree_sitter::LanguageError) -> Self {
        Error::SyntaxError {
            message: e.to_string(),
        }
    }
}

impl From<tree_sitter::QueryError> for Error {
    fn from(e: tree_sitter::QueryError) -> Self {
        Error::SyntaxError {
            message: format!("invalid query: {}", e),
        }
    }
}
