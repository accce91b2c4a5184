//! Attribution storage tiers and their backends.
//!
//! The same attribution is written to four independent locations so that
//! losing one (cleared cookies, disabled storage, private browsing) does not
//! lose the attribution:
//!
//! | Priority | Tier | Backend | Key |
//! |----------|------|---------|-----|
//! | 1 | [`TierKind::PrimaryCookie`] | [`CookieJar`](cookiejar::CookieJar) | `rt_ref` |
//! | 2 | [`TierKind::LegacyCookie`] | [`CookieJar`](cookiejar::CookieJar) | `rentably_affiliate_code` |
//! | 3 | [`TierKind::PrimaryMetadata`] | local + session [`KeyValueStore`] | `rt_ref_meta` |
//! | 4 | [`TierKind::LegacyMetadata`] | local + session [`KeyValueStore`] | `rentably_affiliate_code` |
//!
//! Reads walk the [`TierChain`](chain::TierChain) in priority order and the
//! first valid hit wins. Writes go through to every tier. A failing tier is
//! logged and skipped; it never fails the whole operation.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use reftrack::config::TrackerConfig;
//! use reftrack::storage::chain::TierChain;
//! use reftrack::storage::cookiejar::CookieJar;
//! use reftrack::storage::memory::MemoryStore;
//!
//! let chain = TierChain::from_config(
//!     &TrackerConfig::default(),
//!     Arc::new(CookieJar::new()),
//!     Arc::new(MemoryStore::local()),
//!     Arc::new(MemoryStore::session()),
//! );
//! assert_eq!(chain.len(), 4);
//! ```

use crate::base::trackererror::TrackerError;
use crate::code::RefCode;
use crate::metadata::ReferralMetadata;
use std::fmt;
use time::OffsetDateTime;

pub mod chain;
pub mod cookiejar;
pub mod filestore;
pub mod memory;
pub mod tiers;

/// A synchronous string key/value store, the shape of browser
/// `localStorage`/`sessionStorage`.
pub trait KeyValueStore: Send + Sync {
    /// Store label used in logs and errors.
    fn name(&self) -> &str;

    fn get_item(&self, key: &str) -> Result<Option<String>, TrackerError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), TrackerError>;

    fn remove_item(&self, key: &str) -> Result<(), TrackerError>;
}

/// Identifies a storage tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierKind {
    PrimaryCookie,
    LegacyCookie,
    PrimaryMetadata,
    LegacyMetadata,
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TierKind::PrimaryCookie => "primary-cookie",
            TierKind::LegacyCookie => "legacy-cookie",
            TierKind::PrimaryMetadata => "primary-metadata",
            TierKind::LegacyMetadata => "legacy-metadata",
        };
        f.write_str(name)
    }
}

/// One persistence location for the attribution.
pub trait StorageTier: Send + Sync {
    fn kind(&self) -> TierKind;

    /// The code held by this tier, if present, valid and not expired.
    fn read_code(&self, now: OffsetDateTime) -> Result<Option<RefCode>, TrackerError>;

    /// Full metadata held by this tier. Tiers that only store the raw code
    /// return `Ok(None)`.
    fn read_metadata(
        &self,
        _now: OffsetDateTime,
    ) -> Result<Option<ReferralMetadata>, TrackerError> {
        Ok(None)
    }

    fn write(&self, meta: &ReferralMetadata) -> Result<(), TrackerError>;

    /// Remove this tier's entry. Removing an absent entry is not an error.
    fn clear(&self) -> Result<(), TrackerError>;
}

/// The logical attribution store seen by the engine.
///
/// Implementations swallow backend failures; callers only see hits and
/// misses.
pub trait AttributionStore: Send + Sync {
    fn get(&self, now: OffsetDateTime) -> Option<RefCode>;

    fn metadata(&self, now: OffsetDateTime) -> Option<ReferralMetadata>;

    fn set(&self, meta: &ReferralMetadata);

    fn clear(&self);
}
