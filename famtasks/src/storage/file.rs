//! JSON-file key-value store for values that must survive restarts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{KeyValueStore, StorageError};

/// Persistent store backed by a single JSON object on disk.
///
/// The document is read on first access and cached. Every write rewrites
/// the whole document through a temporary file followed by a rename, so a
/// crash mid-write leaves the previous version intact.
///
/// A document that does not parse is reported once as
/// [`StorageError::Corrupt`]; after that the store starts empty and the
/// next write replaces the file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Option<BTreeMap<String, String>>>,
}

impl FileStore {
    /// Creates a store for `path`. Nothing is touched until the first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let body = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Runs `f` against the cached document, loading it first if needed.
    ///
    /// With `replace_corrupt`, an unparseable document is dropped and `f`
    /// runs against an empty one instead of failing.
    fn with_entries<R>(
        &self,
        replace_corrupt: bool,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> R,
    ) -> Result<R, StorageError> {
        let mut cache = self.cache.lock();
        if cache.is_none() {
            match Self::load(&self.path) {
                Ok(entries) => *cache = Some(entries),
                Err(StorageError::Corrupt(reason)) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        %reason,
                        "storage document is corrupt, starting empty"
                    );
                    *cache = Some(BTreeMap::new());
                    if !replace_corrupt {
                        return Err(StorageError::Corrupt(reason));
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(f(cache.get_or_insert_with(BTreeMap::new)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_entries(false, |entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let snapshot = self.with_entries(true, |entries| {
            entries.insert(key.to_string(), value.to_string());
            entries.clone()
        })?;
        self.persist(&snapshot)?;
        tracing::debug!(key, path = %self.path.display(), "persisted storage entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let snapshot = self.with_entries(false, |entries| entries.remove(key).map(|_| entries.clone()))?;
        if let Some(snapshot) = snapshot {
            self.persist(&snapshot)?;
        }
        Ok(())
    }
}
