//! First-touch attribution policy.
//!
//! The engine decides whether an inbound code may (re)persist:
//!
//! - URL-driven ([`AttributionEngine::init`]): first touch wins. A different
//!   inbound code never replaces a live attribution; the same code refreshes
//!   its TTL.
//! - Programmatic ([`AttributionEngine::set_code`]): always overwrites.

use crate::base::clock::Clock;
use crate::code::RefCode;
use crate::metadata::{ReferralMetadata, Source};
use crate::storage::AttributionStore;
use std::sync::Arc;
use time::Duration;
use url::Url;

/// What [`AttributionEngine::init`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// The page URL has no referral parameter.
    NoSignal,
    /// The parameter is present but not a valid code.
    Invalid,
    /// No attribution existed; the inbound code was persisted.
    Created(RefCode),
    /// The inbound code matches the live attribution; its TTL was refreshed.
    Refreshed(RefCode),
    /// A different code is already attributed and was kept.
    Rejected { incoming: RefCode, existing: RefCode },
    /// The code is valid but its expiry overflows the calendar; nothing
    /// was written.
    Skipped(RefCode),
}

impl InitOutcome {
    /// Whether a write was issued. Individual tiers may still have
    /// rejected it.
    pub fn persisted(&self) -> bool {
        matches!(self, InitOutcome::Created(_) | InitOutcome::Refreshed(_))
    }
}

pub struct AttributionEngine {
    store: Arc<dyn AttributionStore>,
    clock: Arc<dyn Clock>,
    query_param: String,
    ttl: Duration,
}

impl AttributionEngine {
    pub fn new(
        store: Arc<dyn AttributionStore>,
        clock: Arc<dyn Clock>,
        query_param: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            query_param: query_param.into(),
            ttl,
        }
    }

    /// Inspect `page` for an inbound code and apply first-touch policy.
    pub fn init(&self, page: &Url) -> InitOutcome {
        let raw = match page
            .query_pairs()
            .find(|(name, _)| name == self.query_param.as_str())
        {
            Some((_, value)) => value.into_owned(),
            None => return InitOutcome::NoSignal,
        };

        let incoming = match RefCode::normalize(&raw) {
            Some(code) => code,
            None => {
                tracing::debug!(value = %raw, "ignoring invalid referral parameter");
                return InitOutcome::Invalid;
            }
        };

        let now = self.clock.now();
        let outcome = match self.store.get(now) {
            Some(existing) if existing != incoming => {
                tracing::debug!(%incoming, %existing, "first-touch attribution kept");
                return InitOutcome::Rejected { incoming, existing };
            }
            Some(_) => InitOutcome::Refreshed(incoming.clone()),
            None => InitOutcome::Created(incoming.clone()),
        };

        let Some(meta) =
            ReferralMetadata::new(incoming.clone(), now, self.ttl, Source::Query, page.path())
        else {
            tracing::warn!(code = %incoming, ttl = %self.ttl, "attribution expiry out of range");
            return InitOutcome::Skipped(incoming);
        };
        self.store.set(&meta);
        tracing::debug!(code = %meta.code, landing_path = %meta.landing_path, ?outcome, "attribution persisted");
        outcome
    }

    /// Persist `code` unconditionally, replacing any attribution. Returns
    /// false (and does nothing) if the code is invalid.
    pub fn set_code(&self, code: &str, landing_path: &str) -> bool {
        let Some(code) = RefCode::normalize(code) else {
            tracing::debug!("ignoring invalid referral code");
            return false;
        };

        let Some(meta) = ReferralMetadata::new(
            code,
            self.clock.now(),
            self.ttl,
            Source::Storage,
            landing_path,
        ) else {
            tracing::warn!(ttl = %self.ttl, "attribution expiry out of range");
            return false;
        };
        self.store.set(&meta);
        true
    }

    pub fn get_active_code(&self) -> Option<RefCode> {
        self.store.get(self.clock.now())
    }

    pub fn get_metadata(&self) -> Option<ReferralMetadata> {
        self.store.metadata(self.clock.now())
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}
