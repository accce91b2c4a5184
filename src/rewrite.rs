//! Outbound link rewriting.
//!
//! Appends the active referral code to internal navigation targets so the
//! attribution keeps flowing through a visit. Targets are left untouched
//! when they are anchors, `mailto:`/`tel:` links, links to another host,
//! excluded routes, or already carry a `ref=` parameter.

use crate::code::RefCode;
use crate::config::TrackerConfig;
use url::Url;

/// Rewrites outbound URLs.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    param: String,
    excluded_prefixes: Vec<String>,
}

impl LinkRewriter {
    pub fn new(param: impl Into<String>, excluded_prefixes: Vec<String>) -> Self {
        Self {
            param: param.into(),
            excluded_prefixes,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.query_param.clone(), config.excluded_prefixes.clone())
    }

    /// Rewrite `target` as seen from `page`.
    ///
    /// A non-empty `explicit` code is used verbatim; otherwise `active` is
    /// called. With no code, `target` is returned as is.
    pub fn with_ref<F>(&self, page: &Url, target: &str, explicit: Option<&str>, active: F) -> String
    where
        F: FnOnce() -> Option<RefCode>,
    {
        let code = match explicit.filter(|c| !c.is_empty()) {
            Some(code) => code.to_string(),
            None => match active() {
                Some(code) => code.into_string(),
                None => return target.to_string(),
            },
        };

        if self.should_skip(page, target) {
            return target.to_string();
        }

        self.append(target, &code)
    }

    fn should_skip(&self, page: &Url, target: &str) -> bool {
        if target.starts_with('#') || target.starts_with("mailto:") || target.starts_with("tel:") {
            return true;
        }

        let path = match resolve_absolute(page, target) {
            Some(Absolute::External) => return true,
            Some(Absolute::SameHost(path)) => path,
            None => relative_path(target).to_string(),
        };

        if self
            .excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return true;
        }

        target.contains(&format!("{}=", self.param))
    }

    /// Append `param=code`, using `&` if `target` already has a `?`.
    fn append(&self, target: &str, code: &str) -> String {
        let separator = if target.contains('?') { '&' } else { '?' };
        format!("{}{}{}={}", target, separator, self.param, code)
    }
}

enum Absolute {
    External,
    SameHost(String),
}

/// Classify `http(s)://` and protocol-relative targets. Returns `None` for
/// relative targets.
fn resolve_absolute(page: &Url, target: &str) -> Option<Absolute> {
    let lower = target.get(..8).unwrap_or(target).to_ascii_lowercase();
    let is_absolute =
        lower.starts_with("http://") || lower.starts_with("https://") || target.starts_with("//");
    if !is_absolute {
        return None;
    }

    match page.join(target) {
        Ok(url) if url.host_str().is_some() && url.host_str() == page.host_str() => {
            Some(Absolute::SameHost(url.path().to_string()))
        }
        // Unparseable absolute URLs are treated as external.
        _ => Some(Absolute::External),
    }
}

/// Path portion of a relative target, without query and fragment.
fn relative_path(target: &str) -> &str {
    let end = target.find(&['?', '#'][..]).unwrap_or(target.len());
    &target[..end]
}
