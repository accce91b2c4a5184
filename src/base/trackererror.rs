use thiserror::Error;

/// Errors produced by storage backends, code parsing and configuration.
///
/// The public [`ReferralTracker`](crate::tracker::ReferralTracker) API never
/// surfaces these. Per-tier failures are logged and treated as a miss.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TrackerError {
    // Code errors
    #[error("Referral code is not 6-16 alphanumeric characters")]
    InvalidCode,

    // Storage errors
    #[error("Storage access blocked: {store}")]
    StorageBlocked { store: String },
    #[error("Storage quota exceeded in {store} ({needed} bytes needed, {limit} allowed)")]
    QuotaExceeded {
        store: String,
        needed: usize,
        limit: usize,
    },
    #[error("Storage I/O failed for {store}: {message}")]
    StorageIo { store: String, message: String },
    #[error("Malformed entry under key {key}: {message}")]
    MalformedEntry { key: String, message: String },

    // Cookie errors
    #[error("Cookie rejected: {reason}")]
    CookieRejected { reason: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl TrackerError {
    /// Numeric code for the error, grouped by area.
    pub fn as_i32(&self) -> i32 {
        match self {
            TrackerError::InvalidCode => -100,
            TrackerError::StorageBlocked { .. } => -200,
            TrackerError::QuotaExceeded { .. } => -201,
            TrackerError::StorageIo { .. } => -202,
            TrackerError::MalformedEntry { .. } => -203,
            TrackerError::CookieRejected { .. } => -300,
            TrackerError::InvalidConfig { .. } => -400,
        }
    }

    pub fn storage_blocked(store: impl Into<String>) -> Self {
        TrackerError::StorageBlocked {
            store: store.into(),
        }
    }

    pub fn quota_exceeded(store: impl Into<String>, needed: usize, limit: usize) -> Self {
        TrackerError::QuotaExceeded {
            store: store.into(),
            needed,
            limit,
        }
    }

    pub fn storage_io(store: impl Into<String>, message: impl Into<String>) -> Self {
        TrackerError::StorageIo {
            store: store.into(),
            message: message.into(),
        }
    }

    pub fn malformed_entry(key: impl Into<String>, message: impl Into<String>) -> Self {
        TrackerError::MalformedEntry {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn cookie_rejected(reason: impl Into<String>) -> Self {
        TrackerError::CookieRejected {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        TrackerError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
