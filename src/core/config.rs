//! Configuration management

use crate::core::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-project configuration file
pub const PROJECT_CONFIG_FILE: &str = "strata.toml";

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub render: RenderConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Extension of recognized source files (without the dot)
    pub source_extension: String,
    /// Local module name marking a package
    pub package_marker: String,
    /// File and directory names skipped while listing
    pub ignore: Vec<String>,
    /// Skip entries matched by .gitignore
    pub respect_gitignore: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base URL of the PlantUML server
    pub server_url: String,
    /// Output image format
    pub format: ImageFormat,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
    /// Render pool size
    pub workers: usize,
    /// Components above this many nodes are logged as oversized (0 = no limit)
    pub max_component_nodes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Persist built artifacts between runs
    pub enabled: bool,
    /// Override for the cache root
    pub dir: Option<PathBuf>,
}

impl AnalysisConfig {
    /// Whether a listed file or directory name is excluded from analysis
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|pattern| pattern == name)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source_extension: "py".to_string(),
            package_marker: "__init__".to_string(),
            ignore: vec![
                "__pycache__".to_string(),
                ".git".to_string(),
                ".venv".to_string(),
                "venv".to_string(),
                "node_modules".to_string(),
            ],
            respect_gitignore: true,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            format: ImageFormat::Png,
            timeout_secs: 30,
            workers: 4,
            max_component_nodes: 0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl Config {
    /// Load configuration for a project.
    ///
    /// Lookup order: `explicit`, then `strata.toml` in the project root,
    /// then `config.toml` in the strata home directory. Missing files yield defaults.
    pub fn load(explicit: Option<&Path>, project_root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config {
                    message: format!("Config file not found: {}", path.display()),
                });
            }
            return Self::load_from(path);
        }

        let project_config = project_root.join(PROJECT_CONFIG_FILE);
        if project_config.is_file() {
            return Self::load_from(&project_config);
        }

        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse a configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Get the global configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::strata_home()?.join("config.toml"))
    }

    /// Get the strata home directory
    pub fn strata_home() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("STRATA_HOME") {
            return Ok(PathBuf::from(home));
        }

        ProjectDirs::from("dev", "strata", "strata")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| Error::Config {
                message: "Could not determine strata home directory".to_string(),
            })
    }

    /// Get the artifact cache directory for a project
    pub fn cache_dir(&self, project_root: &Path) -> Result<PathBuf> {
        let base = match &self.cache.dir {
            Some(dir) => dir.clone(),
            None => Self::strata_home()?.join("cache"),
        };
        let hash = xxhash_rust::xxh3::xxh3_64(project_root.to_string_lossy().as_bytes());
        Ok(base.join(format!("{:016x}", hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.analysis.source_extension, "py");
        assert_eq!(config.analysis.package_marker, "__init__");
        assert!(config.analysis.is_ignored("__pycache__"));
        assert!(!config.analysis.is_ignored("pkg"));
        assert_eq!(config.render.format, ImageFormat::Png);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[render]
server_url = "http://plantuml:8080"
workers = 2
"#,
        )
        .unwrap();

        assert_eq!(config.render.server_url, "http://plantuml:8080");
        assert_eq!(config.render.workers, 2);
        assert_eq!(config.render.timeout_secs, 30);
        assert_eq!(config.analysis.source_extension, "py");
    }

    #[test]
    fn test_project_config_is_preferred() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[analysis]\nignore = [\"build\"]\n",
        )
        .unwrap();

        let config = Config::load(None, dir.path()).unwrap();
        assert!(config.analysis.is_ignored("build"));
        assert!(!config.analysis.is_ignored("__pycache__"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing), dir.path()),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_cache_dir_is_stable_per_project() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.cache.dir = Some(dir.path().to_path_buf());

        let a = config.cache_dir(Path::new("/work/project")).unwrap();
        let b = config.cache_dir(Path::new("/work/project")).unwrap();
        let c = config.cache_dir(Path::new("/work/other")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with(dir.path()));
    }
}
