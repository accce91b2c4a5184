//! In-memory key/value stores.
//!
//! [`MemoryStore`] stands in for a browser's `localStorage` or
//! `sessionStorage`. Stores can be blocked or given a byte quota to reproduce
//! the failure modes seen in the wild (privacy modes, full storage).

use super::KeyValueStore;
use crate::base::trackererror::TrackerError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// A thread-safe in-memory [`KeyValueStore`].
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    entries: DashMap<String, String>,
    blocked: AtomicBool,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
            blocked: AtomicBool::new(false),
            quota_bytes: None,
        }
    }

    /// A store labelled as durable local storage.
    pub fn local() -> Self {
        Self::named("local")
    }

    /// A store labelled as session-scoped storage.
    pub fn session() -> Self {
        Self::named("session")
    }

    /// Limit the total size of keys plus values.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    fn check_access(&self) -> Result<(), TrackerError> {
        if self.blocked.load(Ordering::SeqCst) {
            return Err(TrackerError::storage_blocked(&self.name));
        }
        Ok(())
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.key() != key)
            .map(|e| e.key().len() + e.value().len())
            .sum()
    }

    /// Drop every entry, as ending a browsing session does for session
    /// storage.
    pub fn end_session(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, TrackerError> {
        self.check_access()?;
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), TrackerError> {
        self.check_access()?;

        if let Some(limit) = self.quota_bytes {
            let needed = self.used_bytes_excluding(key) + key.len() + value.len();
            if needed > limit {
                return Err(TrackerError::quota_exceeded(&self.name, needed, limit));
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), TrackerError> {
        self.check_access()?;
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::local();
        store.set_item("k", "v").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v"));
        store.remove_item("k").unwrap();
        assert_eq!(store.get_item("k").unwrap(), None);
        // Removing again is fine.
        store.remove_item("k").unwrap();
    }

    #[test]
    fn test_quota_exceeded() {
        let store = MemoryStore::session().with_quota(8);
        store.set_item("k", "1234").unwrap();
        let err = store.set_item("other", "1234").unwrap_err();
        assert!(matches!(err, TrackerError::QuotaExceeded { .. }));
        // Overwriting the same key only counts the new value.
        store.set_item("k", "1234567").unwrap();
    }

    #[test]
    fn test_blocked_store() {
        let store = MemoryStore::local();
        store.set_blocked(true);
        assert_eq!(
            store.get_item("k").unwrap_err(),
            TrackerError::storage_blocked("local")
        );
    }
}
