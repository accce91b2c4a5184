//! File-backed key/value store.
//!
//! Models a browser profile's `localStorage` surviving process restarts.
//! The whole store is a single JSON object, rewritten on every change.

use super::KeyValueStore;
use crate::base::context::{IoResultExt, JsonResultExt};
use crate::base::trackererror::TrackerError;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A durable [`KeyValueStore`] persisted to a JSON file.
#[derive(Debug)]
pub struct FileStore {
    name: String,
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open a store. A missing file is an empty store; a malformed file is an
    /// error.
    ///
    /// # Example
    /// ```ignore
    /// let local = FileStore::open("/path/to/profile/local_storage.json")?;
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let path = path.as_ref().to_path_buf();
        let name = format!("file:{}", path.display());

        let entries = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).entry_context(&name)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e).store_context(&name),
        };

        Ok(Self {
            name,
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), TrackerError> {
        let json = serde_json::to_string_pretty(entries).entry_context(&self.name)?;
        fs::write(&self.path, json).store_context(&self.name)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, TrackerError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), TrackerError> {
        let mut entries = self.lock();
        let previous = entries.insert(key.to_string(), value.to_string());

        if let Err(e) = self.flush(&entries) {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), TrackerError> {
        let mut entries = self.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}
