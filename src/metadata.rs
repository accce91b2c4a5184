//! Persisted attribution records.
//!
//! Two on-disk formats exist for the same logical value:
//!
//! | Format | JSON |
//! |--------|------|
//! | [`ReferralMetadata`] | `{code, setAt, landingPath, source, expiry}` |
//! | [`LegacyEntry`] | `{code, timestamp, expiry}` |
//!
//! Timestamps are integer milliseconds since the Unix epoch.

use crate::base::clock::truncate_to_millis;
use crate::code::RefCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// How a code arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// From the `ref` query parameter of a landing URL.
    Query,
    /// Set programmatically.
    Storage,
}

/// The active attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralMetadata {
    pub code: RefCode,
    #[serde(with = "millis")]
    pub set_at: OffsetDateTime,
    pub landing_path: String,
    pub source: Source,
    #[serde(with = "millis")]
    pub expiry: OffsetDateTime,
}

impl ReferralMetadata {
    /// Fresh metadata set at `now`, expiring `ttl` later. Returns `None`
    /// when the expiry is not representable.
    pub fn new(
        code: RefCode,
        now: OffsetDateTime,
        ttl: Duration,
        source: Source,
        landing_path: impl Into<String>,
    ) -> Option<Self> {
        let set_at = truncate_to_millis(now);
        let expiry = set_at.checked_add(ttl)?;
        Some(Self {
            code,
            set_at,
            landing_path: landing_path.into(),
            source,
            expiry,
        })
    }

    /// An entry is live while `expiry > now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expiry <= now
    }
}

/// Entry format written by the previous tracking scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    pub code: RefCode,
    #[serde(with = "millis")]
    pub timestamp: OffsetDateTime,
    #[serde(with = "millis")]
    pub expiry: OffsetDateTime,
}

/// A JSON record that can hold an attribution.
pub trait PersistedEntry: Serialize + DeserializeOwned {
    fn from_metadata(meta: &ReferralMetadata) -> Self;
    fn code(&self) -> &RefCode;
    fn expiry(&self) -> OffsetDateTime;

    /// Full metadata, if the format carries it.
    fn into_metadata(self) -> Option<ReferralMetadata>;
}

impl PersistedEntry for ReferralMetadata {
    fn from_metadata(meta: &ReferralMetadata) -> Self {
        meta.clone()
    }

    fn code(&self) -> &RefCode {
        &self.code
    }

    fn expiry(&self) -> OffsetDateTime {
        self.expiry
    }

    fn into_metadata(self) -> Option<ReferralMetadata> {
        Some(self)
    }
}

impl PersistedEntry for LegacyEntry {
    fn from_metadata(meta: &ReferralMetadata) -> Self {
        Self {
            code: meta.code.clone(),
            timestamp: meta.set_at,
            expiry: meta.expiry,
        }
    }

    fn code(&self) -> &RefCode {
        &self.code
    }

    fn expiry(&self) -> OffsetDateTime {
        self.expiry
    }

    fn into_metadata(self) -> Option<ReferralMetadata> {
        None
    }
}

mod millis {
    use crate::base::clock::{from_millis, to_millis};
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(t: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(to_millis(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let ms = i64::deserialize(deserializer)?;
        from_millis(ms).ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
    }
}
