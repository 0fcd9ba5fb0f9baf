//! Client-local key/value storage.
//!
//! Small string values that outlive a process: the session timeout
//! preference and the auth token/identity. [`MemoryStorage`] keeps them in
//! memory; [`FileStorage`] writes them through to a JSON object file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{Result, StoreError};

/// String key/value storage.
pub trait LocalStorage: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Remove every key.
    fn clear(&self) -> Result<()>;
}

/// In-memory storage that is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.items.write().clear();
        Ok(())
    }
}

/// Storage persisted as a JSON object of strings.
///
/// The file is read once on open and rewritten after every mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open storage at `path`. A missing file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let items = if path.is_file() {
            let contents = std::fs::read_to_string(&path).map_err(|e| StoreError::Read {
                path: path.display().to_string(),
                source: e,
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
                    path: path.display().to_string(),
                    source: e,
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = items.len(), "Opened local storage");

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Write {
            path: self.path.display().to_string(),
            source: e,
        })?;

        trace!(path = %self.path.display(), keys = items.len(), "Local storage flushed");
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write();
        items.insert(key.to_string(), value.to_string());
        self.flush(&items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.write();
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut items = self.items.write();
        items.clear();
        self.flush(&items)
    }
}
