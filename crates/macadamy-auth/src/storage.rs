//! Local key-value persistence.
//!
//! Plays the role browser `localStorage` plays for the web client: a flat map
//! of string keys to string values. [`FileKeyValueStore`] keeps the map in a
//! single JSON file; [`MemoryKeyValueStore`] is for tests and ephemeral runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::AuthError;

const STORAGE_FILE_NAME: &str = "storage.json";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;
    fn remove(&self, key: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// JSON-file backed store. Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Store at `<dir>/storage.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::at(dir.join(STORAGE_FILE_NAME))
    }

    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "read {}: {e}",
                    self.path.display()
                )));
            }
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).or_else(|error| {
            tracing::warn!(path = %self.path.display(), %error, "local storage is corrupt; starting empty");
            Ok(BTreeMap::new())
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuthError::Storage(format!("mkdir {}: {e}", parent.display())))?;
        }
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| AuthError::Storage(format!("encode storage: {e}")))?;
        fs::write(&self.path, raw)
            .map_err(|e| AuthError::Storage(format!("write {}: {e}", self.path.display())))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}
