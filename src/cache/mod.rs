//! Artifact caching
//!
//! Built artifacts are persisted through a [`CacheAdapter`] and held in a
//! per-instance [`Cached`] cell: load if present, else build and store. A
//! cell builds at most once.
//!
//! @module cache

use crate::core::error::Result;
use once_cell::unsync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load/save contract for one persisted artifact
pub trait CacheAdapter<T> {
    fn load(&self) -> Result<Option<T>>;
    fn save(&self, data: &T) -> Result<()>;
    /// Remove the stored copy; returns whether one existed
    fn delete(&self) -> Result<bool>;
}

/// Stores an artifact as `<dir>/<key>.json`
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T> {
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            path: dir.join(format!("{}.json", key)),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize + DeserializeOwned> CacheAdapter<T> for JsonFile<T> {
    fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(data) => {
                debug!(path = %self.path.display(), "Loaded cached artifact");
                Ok(Some(data))
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Discarding unreadable cache file: {}", e);
                Ok(None)
            }
        }
    }

    fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write to a sibling file and rename so readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(data)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "Saved artifact");
        Ok(())
    }

    fn delete(&self) -> Result<bool> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// In-process cell in front of an optional adapter
pub struct Cached<T> {
    key: &'static str,
    cell: OnceCell<T>,
    adapter: Option<Box<dyn CacheAdapter<T>>>,
}

impl<T> Cached<T> {
    /// A cell that never persists
    pub fn in_memory(key: &'static str) -> Self {
        Self {
            key,
            cell: OnceCell::new(),
            adapter: None,
        }
    }

    pub fn with_adapter(key: &'static str, adapter: Box<dyn CacheAdapter<T>>) -> Self {
        Self {
            key,
            cell: OnceCell::new(),
            adapter: Some(adapter),
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Stored value, loading or building it on first use
    pub fn get_or_try_build<F>(&self, build: F) -> Result<&T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.cell.get_or_try_init(|| {
            if let Some(adapter) = &self.adapter {
                if let Some(data) = adapter.load()? {
                    return Ok(data);
                }
            }

            info!(artifact = self.key, "Building");
            let data = build()?;
            if let Some(adapter) = &self.adapter {
                adapter.save(&data)?;
            }
            Ok(data)
        })
    }

    /// Drop the persisted copy; the in-process value is kept
    pub fn delete(&self) -> Result<bool> {
        match &self.adapter {
            Some(adapter) => adapter.delete(),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::tempdir;

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempdir().unwrap();
        let file: JsonFile<Vec<String>> = JsonFile::new(dir.path(), "Rows");
        assert_eq!(file.load().unwrap(), None);

        file.save(&vec!["a".to_string()]).unwrap();
        assert!(file.path().ends_with("Rows.json"));
        assert_eq!(file.load().unwrap(), Some(vec!["a".to_string()]));

        assert!(file.delete().unwrap());
        assert!(!file.delete().unwrap());
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Rows.json"), "{not json").unwrap();
        let file: JsonFile<Vec<String>> = JsonFile::new(dir.path(), "Rows");
        assert_eq!(file.load().unwrap(), None);
    }

    #[test]
    fn test_builds_at_most_once() {
        let builds = Cell::new(0);
        let cached: Cached<u32> = Cached::in_memory("Answer");
        let build = || {
            builds.set(builds.get() + 1);
            Ok(42)
        };

        assert_eq!(*cached.get_or_try_build(build).unwrap(), 42);
        assert_eq!(*cached.get_or_try_build(build).unwrap(), 42);
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn test_loads_before_building() {
        let dir = tempdir().unwrap();
        JsonFile::<u32>::new(dir.path(), "Answer").save(&7).unwrap();

        let cached = Cached::with_adapter("Answer", Box::new(JsonFile::<u32>::new(dir.path(), "Answer")));
        let value = cached
            .get_or_try_build(|| panic!("should load from disk"))
            .unwrap();
        assert_eq!(*value, 7);
    }

    #[test]
    fn test_build_is_persisted() {
        let dir = tempdir().unwrap();
        let cached = Cached::with_adapter("Answer", Box::new(JsonFile::<u32>::new(dir.path(), "Answer")));
        cached.get_or_try_build(|| Ok(5)).unwrap();

        assert_eq!(JsonFile::<u32>::new(dir.path(), "Answer").load().unwrap(), Some(5));
        assert!(cached.delete().unwrap());
    }
}
