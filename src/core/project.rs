//! Analyzed source snapshot

use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Represents a source snapshot selected for analysis
#[derive(Debug, Clone)]
pub struct Project {
    /// Absolute path to the analyzed directory or file
    pub root: PathBuf,
    /// Whether the snapshot is a single source file
    pub is_file: bool,
    /// Root namespace name (directory name or file stem)
    pub name: String,
}

impl Project {
    /// Create project from explicit path (must exist)
    pub fn from_path(path: &Path) -> Result<Self> {
        let root = path.canonicalize().map_err(|_| Error::SourceNotFound {
            path: path.to_path_buf(),
        })?;

        let is_file = root.is_file();
        let name = if is_file {
            root.file_stem()
        } else {
            root.file_name()
        }
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            root,
            is_file,
            name,
        })
    }

    /// Directory holding project-level files such as `strata.toml`
    pub fn config_dir(&self) -> &Path {
        if self.is_file {
            self.root.parent().unwrap_or(&self.root)
        } else {
            &self.root
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_directory_project() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("mypkg");
        std::fs::create_dir(&pkg).unwrap();

        let project = Project::from_path(&pkg).unwrap();
        assert_eq!(project.name, "mypkg");
        assert!(!project.is_file);
        assert_eq!(project.config_dir(), project.root.as_path());
    }

    #[test]
    fn test_file_project() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("script.py");
        std::fs::write(&file, "print('hi')\n").unwrap();

        let project = Project::from_path(&file).unwrap();
        assert_eq!(project.name, "script");
        assert!(project.is_file);
    }

    #[test]
    fn test_missing_path() {
        let dir = tempdir().unwrap();
        let result = Project::from_path(&dir.path().join("missing"));
        assert!(matches!(result, Err(Error::SourceNotFound { .. })));
    }
}
