use crate::core::config::AnalysisConfig;
use crate::core::error::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An immediate child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Directory(PathBuf),
    SourceFile(PathBuf),
}

/// Lists directory children respecting .gitignore and the configured ignore list
pub struct DirectoryLister<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> DirectoryLister<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Immediate subdirectories and source files of `dir`, sorted by name
    pub fn list(&self, dir: &Path) -> Result<Vec<Entry>> {
        let respect_gitignore = self.config.respect_gitignore;
        let walker = WalkBuilder::new(dir)
            .max_depth(Some(1))
            .hidden(true)               // Skip hidden entries
            .git_ignore(respect_gitignore)
            .git_global(respect_gitignore)
            .git_exclude(respect_gitignore)
            .require_git(false)         // Work even without .git
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut entries = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let name = entry.file_name().to_string_lossy();
            if self.config.is_ignored(&name) {
                debug!(path = %path.display(), "Ignored by configuration");
                continue;
            }

            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                entries.push(Entry::Directory(path.to_path_buf()));
            } else if self.is_source_file(path) {
                entries.push(Entry::SourceFile(path.to_path_buf()));
            } else {
                debug!(path = %path.display(), "Not a source file");
            }
        }

        Ok(entries)
    }

    /// Check if a file carries the source extension
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext == self.config.source_extension)
            .unwrap_or(false)
    }
}
