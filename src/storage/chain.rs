use super::cookiejar::CookieJar;
use super::tiers::{CookieTier, LegacyMetadataTier, PrimaryMetadataTier};
use super::{AttributionStore, KeyValueStore, StorageTier, TierKind};
use crate::base::trackererror::TrackerError;
use crate::code::RefCode;
use crate::config::TrackerConfig;
use crate::metadata::ReferralMetadata;
use std::sync::Arc;
use time::OffsetDateTime;

/// Tiers in read-priority order.
///
/// Reads return the first hit; writes and clears go to every tier. Tier
/// failures are logged at `debug` and otherwise ignored.
pub struct TierChain {
    tiers: Vec<Box<dyn StorageTier>>,
}

impl TierChain {
    pub fn new(tiers: Vec<Box<dyn StorageTier>>) -> Self {
        Self { tiers }
    }

    /// The standard four-tier layout: primary cookie, legacy cookie,
    /// primary metadata, legacy metadata.
    pub fn from_config(
        config: &TrackerConfig,
        jar: Arc<CookieJar>,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self::new(vec![
            Box::new(CookieTier::primary(config, jar.clone())),
            Box::new(CookieTier::legacy(config, jar)),
            Box::new(PrimaryMetadataTier::primary(
                config,
                durable.clone(),
                session.clone(),
            )),
            Box::new(LegacyMetadataTier::legacy(config, durable, session)),
        ])
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn kinds(&self) -> Vec<TierKind> {
        self.tiers.iter().map(|t| t.kind()).collect()
    }

    /// First valid, unexpired code in priority order.
    pub fn read_code(&self, now: OffsetDateTime) -> Option<RefCode> {
        self.tiers.iter().find_map(|tier| match tier.read_code(now) {
            Ok(code) => code,
            Err(e) => {
                tracing::debug!(tier = %tier.kind(), error = %e, "tier read failed");
                None
            }
        })
    }

    /// First live full metadata record in priority order.
    pub fn read_metadata(&self, now: OffsetDateTime) -> Option<ReferralMetadata> {
        self.tiers.iter().find_map(|tier| match tier.read_metadata(now) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(tier = %tier.kind(), error = %e, "tier metadata read failed");
                None
            }
        })
    }

    /// Write through to every tier. Returns the tiers that accepted the
    /// write.
    pub fn write(&self, meta: &ReferralMetadata) -> Vec<TierKind> {
        self.tiers
            .iter()
            .filter_map(|tier| match tier.write(meta) {
                Ok(()) => Some(tier.kind()),
                Err(e) => {
                    tracing::debug!(tier = %tier.kind(), error = %e, "tier write failed");
                    None
                }
            })
            .collect()
    }

    /// Remove the entry from every tier, attempting all of them.
    pub fn clear(&self) {
        for tier in &self.tiers {
            if let Err(e) = tier.clear() {
                tracing::debug!(tier = %tier.kind(), error = %e, "tier clear failed");
            }
        }
    }

    /// Per-tier read results, for diagnostics.
    pub fn inspect(
        &self,
        now: OffsetDateTime,
    ) -> Vec<(TierKind, Result<Option<RefCode>, TrackerError>)> {
        self.tiers
            .iter()
            .map(|tier| (tier.kind(), tier.read_code(now)))
            .collect()
    }
}

impl AttributionStore for TierChain {
    fn get(&self, now: OffsetDateTime) -> Option<RefCode> {
        self.read_code(now)
    }

    fn metadata(&self, now: OffsetDateTime) -> Option<ReferralMetadata> {
        self.read_metadata(now)
    }

    fn set(&self, meta: &ReferralMetadata) {
        let written = self.write(meta);
        if written.is_empty() {
            tracing::debug!(code = %meta.code, "no tier accepted the attribution");
        }
    }

    fn clear(&self) {
        TierChain::clear(self);
    }
}
