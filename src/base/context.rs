//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO and JSON errors into context-rich `TrackerError` variants.

use crate::base::trackererror::TrackerError;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add store context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use reftrack::base::context::IoResultExt;
    ///
    /// let raw = fs::read_to_string(&path).store_context("local:/tmp/profile.json")?;
    /// // Error: "Storage I/O failed for local:/tmp/profile.json: permission denied"
    /// ```
    fn store_context(self, store: &str) -> Result<T, TrackerError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn store_context(self, store: &str) -> Result<T, TrackerError> {
        self.map_err(|e| TrackerError::storage_io(store, e.to_string()))
    }
}

/// Extension trait for adding the storage key to JSON decode errors.
pub trait JsonResultExt<T> {
    fn entry_context(self, key: &str) -> Result<T, TrackerError>;
}

impl<T> JsonResultExt<T> for Result<T, serde_json::Error> {
    fn entry_context(self, key: &str) -> Result<T, TrackerError> {
        self.map_err(|e| TrackerError::malformed_entry(key, e.to_string()))
    }
}
