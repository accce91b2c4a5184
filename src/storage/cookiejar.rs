use crate::base::clock::{Clock, SystemClock};
use crate::base::trackererror::TrackerError;
use cookie::Cookie;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;

/// Maximum cookies held by one jar. Browsers allow ~180 per domain; the
/// attribution tiers need two.
const MAX_COOKIES: usize = 180;

#[derive(Debug, Clone)]
struct StoredCookie {
    cookie: Cookie<'static>,
    creation_time: OffsetDateTime,
    /// Absolute expiry resolved from `Max-Age` (preferred) or `Expires`.
    /// `None` is a session cookie.
    expires_at: Option<OffsetDateTime>,
}

impl StoredCookie {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// An origin-scoped cookie jar with browser expiry semantics.
///
/// Cookies are keyed by name. Expired cookies are never returned and are
/// pruned when touched. The jar can be shared (`Arc`) between trackers to
/// model several tabs of the same origin; concurrent writes are
/// last-write-wins.
pub struct CookieJar {
    store: Arc<DashMap<String, StoredCookie>>,
    clock: Arc<dyn Clock>,
    blocked: AtomicBool,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            clock,
            blocked: AtomicBool::new(false),
        }
    }

    /// Seed a jar from a `Cookie:` request header (`a=1; b=2`).
    /// Unparseable pairs are skipped.
    pub fn from_request_header(header: &str, clock: Arc<dyn Clock>) -> Self {
        let jar = Self::with_clock(clock);
        jar.load_request_header(header);
        jar
    }

    /// Simulate the user or browser blocking cookie access.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    fn check_access(&self) -> Result<(), TrackerError> {
        if self.is_blocked() {
            return Err(TrackerError::storage_blocked("cookies"));
        }
        Ok(())
    }

    /// Store a cookie. A cookie whose expiry is already in the past deletes
    /// any cookie of the same name, as browsers do.
    pub fn set_cookie(&self, cookie: Cookie<'static>) -> Result<(), TrackerError> {
        self.check_access()?;

        if cookie.name().is_empty() {
            return Err(TrackerError::cookie_rejected("empty cookie name"));
        }

        let now = self.clock.now();
        let expires_at = match (cookie.max_age(), cookie.expires_datetime()) {
            (Some(max_age), _) => Some(
                now.checked_add(max_age)
                    .ok_or_else(|| TrackerError::cookie_rejected("Max-Age out of range"))?,
            ),
            (None, Some(expires)) => Some(expires),
            (None, None) => None,
        };

        let name = cookie.name().to_string();
        let stored = StoredCookie {
            cookie,
            creation_time: now,
            expires_at,
        };

        if stored.is_expired(now) {
            self.store.remove(&name);
            return Ok(());
        }

        self.store.insert(name, stored);
        self.enforce_limit();
        Ok(())
    }

    /// Evict the oldest cookies once the jar is over capacity.
    fn enforce_limit(&self) {
        while self.store.len() > MAX_COOKIES {
            let oldest = self
                .store
                .iter()
                .min_by_key(|entry| entry.value().creation_time)
                .map(|entry| entry.key().clone());

            match oldest {
                Some(name) => {
                    self.store.remove(&name);
                }
                None => break,
            }
        }
    }

    /// Parse a `Set-Cookie` header value and store the result.
    pub fn parse_and_save_cookie(&self, cookie_line: &str) -> Result<(), TrackerError> {
        let parsed = Cookie::parse(cookie_line.to_string())
            .map_err(|e| TrackerError::cookie_rejected(e.to_string()))?;
        self.set_cookie(parsed)
    }

    /// Load `name=value` pairs from a `Cookie:` request header as session
    /// cookies. Returns the number of cookies loaded.
    pub fn load_request_header(&self, header: &str) -> usize {
        let mut count = 0;
        for parsed in Cookie::split_parse(header.to_string()) {
            match parsed {
                Ok(c) => {
                    if self.set_cookie(c.into_owned()).is_ok() {
                        count += 1;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unparseable cookie pair");
                }
            }
        }
        count
    }

    /// Value of a live cookie.
    pub fn get_value(&self, name: &str) -> Result<Option<String>, TrackerError> {
        self.check_access()?;

        let now = self.clock.now();
        let expired = match self.store.get(name) {
            Some(entry) if !entry.is_expired(now) => {
                return Ok(Some(entry.cookie.value().to_string()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.store.remove(name);
        }
        Ok(None)
    }

    /// Absolute expiry of a live cookie; `None` for missing or session
    /// cookies.
    pub fn expires_at(&self, name: &str) -> Option<OffsetDateTime> {
        let now = self.clock.now();
        self.store
            .get(name)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.expires_at)
    }

    pub fn remove(&self, name: &str) -> Result<(), TrackerError> {
        self.check_access()?;
        self.store.remove(name);
        Ok(())
    }

    /// Render live cookies as a `Cookie:` request header, in name order.
    pub fn request_header(&self) -> String {
        let now = self.clock.now();
        let mut pairs: Vec<(String, String)> = self
            .store
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .map(|entry| {
                let c = &entry.value().cookie;
                (c.name().to_string(), c.value().to_string())
            })
            .collect();
        pairs.sort();

        pairs
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `Set-Cookie` header values for every live cookie, in name order.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut headers: Vec<(String, String)> = self
            .store
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .map(|entry| {
                let c = &entry.value().cookie;
                (c.name().to_string(), c.encoded().to_string())
            })
            .collect();
        headers.sort();
        headers.into_iter().map(|(_, header)| header).collect()
    }

    /// Number of live cookies.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.store
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop session cookies, as closing the browser does.
    pub fn end_session(&self) {
        self.store.retain(|_, c| c.expires_at.is_some());
    }

    /// Clear all cookies.
    pub fn clear(&self) {
        self.store.clear();
    }
}
