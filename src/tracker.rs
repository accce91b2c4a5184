//! The referral tracking API consumed by the rest of the application.
//!
//! Build one [`ReferralTracker`] at start-up and hand it to whatever needs
//! it (page load hooks, link components, signup). Nothing here panics or
//! returns an error: invalid input is ignored and storage failures degrade
//! to misses.
//!
//! # Example
//!
//! ```rust
//! use reftrack::tracker::ReferralTracker;
//! use url::Url;
//!
//! let tracker = ReferralTracker::in_memory();
//! let landing = Url::parse("https://rentably.de/preise?ref=abc123").unwrap();
//! tracker.init_referral_tracking(&landing);
//!
//! assert_eq!(tracker.get_referral_code().as_deref(), Some("ABC123"));
//! assert_eq!(
//!     tracker.with_ref(&landing, "/funktionen", None),
//!     "/funktionen?ref=ABC123"
//! );
//! ```

use crate::attribution::{AttributionEngine, InitOutcome};
use crate::base::clock::{Clock, SystemClock};
use crate::code::{self, RefCode};
use crate::config::TrackerConfig;
use crate::metadata::ReferralMetadata;
use crate::rewrite::LinkRewriter;
use crate::storage::chain::TierChain;
use crate::storage::cookiejar::CookieJar;
use crate::storage::memory::MemoryStore;
use crate::storage::{KeyValueStore, TierKind};
use std::sync::Arc;
use url::Url;

/// Referral attribution facade.
pub struct ReferralTracker {
    config: TrackerConfig,
    chain: Arc<TierChain>,
    engine: AttributionEngine,
    rewriter: LinkRewriter,
    clock: Arc<dyn Clock>,
}

impl ReferralTracker {
    pub fn builder() -> ReferralTrackerBuilder {
        ReferralTrackerBuilder::new()
    }

    /// Default configuration over fresh in-memory backends.
    pub fn in_memory() -> Self {
        Self::builder().build()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The active referral code, uppercase.
    pub fn get_referral_code(&self) -> Option<String> {
        self.engine.get_active_code().map(RefCode::into_string)
    }

    /// The active metadata record from the primary metadata tier.
    pub fn get_referral_metadata(&self) -> Option<ReferralMetadata> {
        self.engine.get_metadata()
    }

    /// Set the attribution programmatically, overwriting any existing one.
    /// The landing path is recorded as `/`.
    pub fn set_referral_code(&self, code: &str) -> bool {
        self.engine.set_code(code, "/")
    }

    /// Like [`set_referral_code`](Self::set_referral_code), recording
    /// `page`'s path as the landing path.
    pub fn set_referral_code_from(&self, page: &Url, code: &str) -> bool {
        self.engine.set_code(code, page.path())
    }

    pub fn clear_referral_code(&self) {
        self.engine.clear();
    }

    /// Page-load hook: pick up `?ref=` from `page` under first-touch rules.
    pub fn init_referral_tracking(&self, page: &Url) -> InitOutcome {
        self.engine.init(page)
    }

    /// Append the referral code to an internal link. `ref_code` overrides
    /// the stored code.
    pub fn with_ref(&self, page: &Url, url: &str, ref_code: Option<&str>) -> String {
        self.rewriter
            .with_ref(page, url, ref_code, || self.engine.get_active_code())
    }

    pub fn is_valid_ref_code(&self, code: &str) -> bool {
        code::is_valid(code)
    }

    /// Tiers that currently hold a valid, live code.
    pub fn live_tiers(&self) -> Vec<TierKind> {
        self.chain
            .inspect(self.clock.now())
            .into_iter()
            .filter_map(|(kind, result)| match result {
                Ok(Some(_)) => Some(kind),
                _ => None,
            })
            .collect()
    }
}

/// Free-function form of [`ReferralTracker::is_valid_ref_code`].
pub fn is_valid_ref_code(code: &str) -> bool {
    code::is_valid(code)
}

/// Builder for [`ReferralTracker`]. Unset backends default to fresh
/// in-memory ones.
#[must_use]
#[derive(Default)]
pub struct ReferralTrackerBuilder {
    config: Option<TrackerConfig>,
    clock: Option<Arc<dyn Clock>>,
    cookies: Option<Arc<CookieJar>>,
    local: Option<Arc<dyn KeyValueStore>>,
    session: Option<Arc<dyn KeyValueStore>>,
}

impl ReferralTrackerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn cookies(mut self, jar: Arc<CookieJar>) -> Self {
        self.cookies = Some(jar);
        self
    }

    pub fn local_storage(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.local = Some(store);
        self
    }

    pub fn session_storage(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.session = Some(store);
        self
    }

    pub fn build(self) -> ReferralTracker {
        let config = self.config.unwrap_or_default();
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "tracker configuration is invalid; values used as given");
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let cookies = self
            .cookies
            .unwrap_or_else(|| Arc::new(CookieJar::with_clock(clock.clone())));
        let local = self
            .local
            .unwrap_or_else(|| Arc::new(MemoryStore::local()) as Arc<dyn KeyValueStore>);
        let session = self
            .session
            .unwrap_or_else(|| Arc::new(MemoryStore::session()) as Arc<dyn KeyValueStore>);

        let chain = Arc::new(TierChain::from_config(&config, cookies, local, session));
        let engine = AttributionEngine::new(
            chain.clone(),
            clock.clone(),
            config.query_param.clone(),
            config.ttl(),
        );
        let rewriter = LinkRewriter::from_config(&config);

        ReferralTracker {
            config,
            chain,
            engine,
            rewriter,
            clock,
        }
    }
}
