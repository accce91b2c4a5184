//! Configuration loading tests.

use reftrack::base::trackererror::TrackerError;
use reftrack::config::{SameSitePolicy, TrackerConfig};
use reftrack::storage::cookiejar::CookieJar;
use reftrack::tracker::ReferralTracker;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use time::Duration;
use url::Url;

#[test]
fn test_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracker.json");
    fs::write(
        &path,
        r#"{
            "ttl_secs": 604800,
            "query_param": "partner",
            "excluded_prefixes": ["/konto"],
            "cookie_domain": ".rentably.de",
            "same_site": "strict"
        }"#,
    )
    .unwrap();

    let config = TrackerConfig::from_file(&path).unwrap();
    assert_eq!(config.ttl(), Duration::days(7));
    assert_eq!(config.query_param, "partner");
    assert_eq!(config.excluded_prefixes, vec!["/konto"]);
    assert_eq!(config.same_site, SameSitePolicy::Strict);
    assert_eq!(config.cookie_name, "rt_ref");
}

#[test]
fn test_missing_file_is_storage_error() {
    let dir = tempdir().unwrap();
    let err = TrackerConfig::from_file(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, TrackerError::StorageIo { .. }));
}

#[test]
fn test_invalid_json_is_config_error() {
    let err = TrackerConfig::from_json_str("{ttl_secs: 1}").unwrap_err();
    assert!(matches!(err, TrackerError::InvalidConfig { .. }));
}

#[test]
fn test_out_of_range_ttl_never_panics() {
    let config = TrackerConfig {
        ttl_secs: 9_000_000_000_000,
        ..TrackerConfig::default()
    };
    assert!(config.validate().is_err());

    // Used as given by the builder: writes are skipped, nothing panics.
    let tracker = ReferralTracker::builder().config(config).build();
    let page = Url::parse("https://rentably.de/?ref=AAA111").unwrap();
    assert!(!tracker.init_referral_tracking(&page).persisted());
    assert!(!tracker.set_referral_code("BBB222"));
    assert_eq!(tracker.get_referral_code(), None);
}

#[test]
fn test_custom_config_drives_tracker() {
    let config = TrackerConfig::builder()
        .query_param("partner")
        .excluded_prefixes(&["/konto"])
        .cookie_domain("rentably.de")
        .ttl(Duration::days(7))
        .build()
        .unwrap();
    let jar = Arc::new(CookieJar::new());
    let tracker = ReferralTracker::builder()
        .config(config)
        .cookies(jar.clone())
        .build();

    let page = Url::parse("https://www.rentably.de/?partner=abc123").unwrap();
    assert!(tracker.init_referral_tracking(&page).persisted());

    let header = jar
        .set_cookie_headers()
        .into_iter()
        .find(|h| h.starts_with("rt_ref="))
        .unwrap();
    assert!(header.contains("Domain=rentably.de"));
    assert!(header.contains("Max-Age=604800"));

    assert_eq!(tracker.with_ref(&page, "/konto", None), "/konto");
    assert_eq!(tracker.with_ref(&page, "/dashboard", None), "/dashboard?partner=ABC123");
}
