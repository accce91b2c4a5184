//! Tracker configuration.
//!
//! Defaults reproduce the deployed storage layout (cookie and storage key
//! names, 30-day TTL, excluded route prefixes). Configuration can be built
//! in code with [`TrackerConfigBuilder`] or loaded from JSON.

use crate::base::context::{IoResultExt, JsonResultExt};
use crate::base::trackererror::TrackerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::Duration;

/// Default attribution lifetime: 30 days.
pub const DEFAULT_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Longest accepted attribution lifetime: 400 days, the cap browsers put on
/// cookie lifetimes.
pub const MAX_TTL_SECS: i64 = 400 * 24 * 60 * 60;

pub const DEFAULT_QUERY_PARAM: &str = "ref";
pub const DEFAULT_COOKIE_NAME: &str = "rt_ref";
pub const DEFAULT_LEGACY_COOKIE_NAME: &str = "rentably_affiliate_code";
pub const DEFAULT_META_KEY: &str = "rt_ref_meta";
pub const DEFAULT_LEGACY_META_KEY: &str = "rentably_affiliate_code";
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &["/admin", "/dashboard", "/logout", "/api"];

/// `SameSite` policy applied to the attribution cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

impl From<SameSitePolicy> for cookie::SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => cookie::SameSite::Strict,
            SameSitePolicy::Lax => cookie::SameSite::Lax,
            SameSitePolicy::None => cookie::SameSite::None,
        }
    }
}

/// Tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Attribution lifetime in seconds.
    pub ttl_secs: i64,

    /// Query parameter carrying the inbound code.
    pub query_param: String,

    /// Primary cookie name.
    pub cookie_name: String,

    /// Cookie name used by the previous tracking scheme.
    pub legacy_cookie_name: String,

    /// Storage key of the primary metadata entry.
    pub meta_key: String,

    /// Storage key of the legacy `{code, timestamp, expiry}` entry.
    pub legacy_meta_key: String,

    /// Route prefixes that never get the code appended.
    pub excluded_prefixes: Vec<String>,

    /// Cookie `Domain` attribute. `None` means host-only.
    pub cookie_domain: Option<String>,

    /// Cookie `Path` attribute.
    pub cookie_path: String,

    pub same_site: SameSitePolicy,

    /// Set the `Secure` attribute on attribution cookies.
    pub secure: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            query_param: DEFAULT_QUERY_PARAM.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            legacy_cookie_name: DEFAULT_LEGACY_COOKIE_NAME.to_string(),
            meta_key: DEFAULT_META_KEY.to_string(),
            legacy_meta_key: DEFAULT_LEGACY_META_KEY.to_string(),
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            cookie_domain: None,
            cookie_path: "/".to_string(),
            same_site: SameSitePolicy::Lax,
            secure: false,
        }
    }
}

impl TrackerConfig {
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::new()
    }

    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs)
    }

    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self, TrackerError> {
        let config: TrackerConfig = serde_json::from_str(json)
            .map_err(|e| TrackerError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, TrackerError> {
        let raw = std::fs::read_to_string(path).store_context(&path.display().to_string())?;
        Self::from_json_str(&raw)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, TrackerError> {
        serde_json::to_string_pretty(self).entry_context("config")
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.ttl_secs <= 0 {
            return Err(TrackerError::invalid_config("ttl_secs must be positive"));
        }
        if self.ttl_secs > MAX_TTL_SECS {
            return Err(TrackerError::invalid_config(format!(
                "ttl_secs must not exceed {}",
                MAX_TTL_SECS
            )));
        }

        let names = [
            ("query_param", &self.query_param),
            ("cookie_name", &self.cookie_name),
            ("legacy_cookie_name", &self.legacy_cookie_name),
            ("meta_key", &self.meta_key),
            ("legacy_meta_key", &self.legacy_meta_key),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(TrackerError::invalid_config(format!("{} is empty", field)));
            }
        }

        if self.cookie_name == self.legacy_cookie_name {
            return Err(TrackerError::invalid_config(
                "cookie_name and legacy_cookie_name must differ",
            ));
        }
        if self.meta_key == self.legacy_meta_key {
            return Err(TrackerError::invalid_config(
                "meta_key and legacy_meta_key must differ",
            ));
        }

        if let Some(prefix) = self.excluded_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(TrackerError::invalid_config(format!(
                "excluded prefix {:?} must start with '/'",
                prefix
            )));
        }

        if !self.cookie_path.starts_with('/') {
            return Err(TrackerError::invalid_config("cookie_path must start with '/'"));
        }

        if let Some(domain) = &self.cookie_domain {
            let domain = domain.trim_start_matches('.');
            if domain.is_empty() || is_public_suffix(domain) {
                return Err(TrackerError::invalid_config(format!(
                    "cookie_domain {:?} is a public suffix",
                    domain
                )));
            }
        }

        if self.same_site == SameSitePolicy::None && !self.secure {
            return Err(TrackerError::invalid_config(
                "same_site = none requires secure cookies",
            ));
        }

        Ok(())
    }
}

/// Returns true if `domain` is itself a public suffix (e.g. `com`, `co.uk`),
/// on which browsers refuse to set cookies.
fn is_public_suffix(domain: &str) -> bool {
    use psl::{List, Psl};

    let lower = domain.to_lowercase();
    let bytes = lower.as_bytes();
    List.suffix(bytes)
        .map(|suffix| suffix.as_bytes() == bytes)
        .unwrap_or(false)
}

/// Builder for [`TrackerConfig`].
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct TrackerConfigBuilder {
    config: TrackerConfig,
}

impl TrackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl_secs = ttl.whole_seconds();
        self
    }

    pub fn query_param(mut self, name: &str) -> Self {
        self.config.query_param = name.to_string();
        self
    }

    pub fn cookie_names(mut self, primary: &str, legacy: &str) -> Self {
        self.config.cookie_name = primary.to_string();
        self.config.legacy_cookie_name = legacy.to_string();
        self
    }

    pub fn meta_keys(mut self, primary: &str, legacy: &str) -> Self {
        self.config.meta_key = primary.to_string();
        self.config.legacy_meta_key = legacy.to_string();
        self
    }

    pub fn excluded_prefixes(mut self, prefixes: &[&str]) -> Self {
        self.config.excluded_prefixes = prefixes.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn exclude_prefix(mut self, prefix: &str) -> Self {
        self.config.excluded_prefixes.push(prefix.to_string());
        self
    }

    pub fn cookie_domain(mut self, domain: &str) -> Self {
        self.config.cookie_domain = Some(domain.to_string());
        self
    }

    pub fn cookie_path(mut self, path: &str) -> Self {
        self.config.cookie_path = path.to_string();
        self
    }

    pub fn same_site(mut self, policy: SameSitePolicy) -> Self {
        self.config.same_site = policy;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.config.secure = secure;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<TrackerConfig, TrackerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
