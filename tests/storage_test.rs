//! Storage tier resilience tests.

use reftrack::base::clock::{to_millis, Clock, ManualClock};
use reftrack::storage::cookiejar::CookieJar;
use reftrack::storage::filestore::FileStore;
use reftrack::storage::memory::MemoryStore;
use reftrack::storage::{KeyValueStore, TierKind};
use reftrack::tracker::ReferralTracker;
use std::sync::Arc;
use tempfile::tempdir;
use time::Duration;
use url::Url;

fn landing(code: &str) -> Url {
    Url::parse(&format!("https://rentably.de/?ref={}", code)).unwrap()
}

fn tracker_over(
    clock: &Arc<ManualClock>,
    jar: &Arc<CookieJar>,
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
) -> ReferralTracker {
    ReferralTracker::builder()
        .clock(clock.clone())
        .cookies(jar.clone())
        .local_storage(local)
        .session_storage(session)
        .build()
}

#[test]
fn test_blocked_cookies_still_attribute() {
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::with_clock(clock.clone()));
    jar.set_blocked(true);
    let tracker = tracker_over(
        &clock,
        &jar,
        Arc::new(MemoryStore::local()),
        Arc::new(MemoryStore::session()),
    );

    tracker.init_referral_tracking(&landing("AAA111"));
    assert_eq!(tracker.get_referral_code().as_deref(), Some("AAA111"));
    assert_eq!(
        tracker.live_tiers(),
        vec![TierKind::PrimaryMetadata, TierKind::LegacyMetadata]
    );
}

#[test]
fn test_blocked_storage_still_attributes_via_cookies() {
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::with_clock(clock.clone()));
    let local = Arc::new(MemoryStore::local());
    let session = Arc::new(MemoryStore::session());
    local.set_blocked(true);
    session.set_blocked(true);
    let tracker = tracker_over(&clock, &jar, local, session);

    tracker.init_referral_tracking(&landing("AAA111"));
    assert_eq!(tracker.get_referral_code().as_deref(), Some("AAA111"));
    // Full metadata lives only in storage.
    assert!(tracker.get_referral_metadata().is_none());
}

#[test]
fn test_everything_blocked_degrades_to_none() {
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::with_clock(clock.clone()));
    let local = Arc::new(MemoryStore::local());
    let session = Arc::new(MemoryStore::session());
    jar.set_blocked(true);
    local.set_blocked(true);
    session.set_blocked(true);
    let tracker = tracker_over(&clock, &jar, local, session);

    tracker.init_referral_tracking(&landing("AAA111"));
    assert_eq!(tracker.get_referral_code(), None);
    assert!(tracker.live_tiers().is_empty());
    assert_eq!(
        tracker.with_ref(&landing("AAA111"), "/preise", None),
        "/preise"
    );
    tracker.clear_referral_code();
}

#[test]
fn test_quota_exceeded_in_session_only() {
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::with_clock(clock.clone()));
    let local = Arc::new(MemoryStore::local());
    let session = Arc::new(MemoryStore::session().with_quota(16));
    let tracker = tracker_over(&clock, &jar, local.clone(), session.clone());

    tracker.set_referral_code("ABC123");
    jar.clear();

    assert!(session.is_empty());
    assert_eq!(local.len(), 2);
    assert_eq!(tracker.get_referral_code().as_deref(), Some("ABC123"));
}

#[test]
fn test_legacy_only_state_is_honoured() {
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::with_clock(clock.clone()));
    let local = Arc::new(MemoryStore::local());
    let now_ms = to_millis(clock.now());
    let expiry_ms = to_millis(clock.now() + Duration::days(3));
    local
        .set_item(
            "rentably_affiliate_code",
            &format!(
                r#"{{"code":"old123","timestamp":{},"expiry":{}}}"#,
                now_ms, expiry_ms
            ),
        )
        .unwrap();
    let tracker = tracker_over(&clock, &jar, local, Arc::new(MemoryStore::session()));

    assert_eq!(tracker.get_referral_code().as_deref(), Some("OLD123"));
    // Legacy entries carry no landing path or source.
    assert!(tracker.get_referral_metadata().is_none());

    // First touch applies to legacy attributions too.
    let outcome = tracker.init_referral_tracking(&landing("NEW456"));
    assert!(!outcome.persisted());
    assert_eq!(tracker.get_referral_code().as_deref(), Some("OLD123"));
}

#[test]
fn test_legacy_cookie_only_is_honoured() {
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::with_clock(clock.clone()));
    jar.parse_and_save_cookie("rentably_affiliate_code=legacy1; Max-Age=3600")
        .unwrap();
    let tracker = tracker_over(
        &clock,
        &jar,
        Arc::new(MemoryStore::local()),
        Arc::new(MemoryStore::session()),
    );

    assert_eq!(tracker.get_referral_code().as_deref(), Some("LEGACY1"));

    // Re-arriving with the same code migrates it into every tier.
    tracker.init_referral_tracking(&landing("legacy1"));
    assert_eq!(tracker.live_tiers().len(), 4);
}

#[test]
fn test_malformed_metadata_is_a_miss() {
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::with_clock(clock.clone()));
    let local = Arc::new(MemoryStore::local());
    local.set_item("rt_ref_meta", "{\"code\":").unwrap();
    local
        .set_item("rentably_affiliate_code", "not json at all")
        .unwrap();
    let tracker = tracker_over(&clock, &jar, local, Arc::new(MemoryStore::session()));

    assert_eq!(tracker.get_referral_code(), None);
    assert!(tracker.get_referral_metadata().is_none());

    // Malformed entries do not block a fresh attribution.
    assert!(tracker
        .init_referral_tracking(&landing("AAA111"))
        .persisted());
    assert_eq!(tracker.get_referral_code().as_deref(), Some("AAA111"));
}

#[test]
fn test_attribution_survives_browser_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::with_clock(clock.clone()));

    {
        let local = Arc::new(FileStore::open(&path).unwrap());
        let tracker = tracker_over(&clock, &jar, local, Arc::new(MemoryStore::session()));
        tracker.init_referral_tracking(&landing("AAA111"));
    }

    // New process: session storage is gone and the user cleared cookies.
    jar.end_session();
    jar.clear();
    clock.advance(Duration::days(2));

    let local = Arc::new(FileStore::open(&path).unwrap());
    let tracker = tracker_over(&clock, &jar, local, Arc::new(MemoryStore::session()));
    assert_eq!(tracker.get_referral_code().as_deref(), Some("AAA111"));
    assert_eq!(tracker.get_referral_metadata().unwrap().landing_path, "/");
}

#[test]
fn test_tabs_share_state_last_write_wins() {
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::with_clock(clock.clone()));
    let local: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::local());

    // Each tab has its own session storage but shares cookies and local.
    let tab_a = tracker_over(&clock, &jar, local.clone(), Arc::new(MemoryStore::session()));
    let tab_b = tracker_over(&clock, &jar, local.clone(), Arc::new(MemoryStore::session()));

    tab_a.init_referral_tracking(&landing("AAA111"));
    assert_eq!(tab_b.get_referral_code().as_deref(), Some("AAA111"));

    tab_b.set_referral_code("BBB222");
    assert_eq!(tab_a.get_referral_code().as_deref(), Some("BBB222"));
}

#[test]
fn test_cookie_header_round_trip_from_server() {
    let clock = Arc::new(ManualClock::starting_now());
    let jar = Arc::new(CookieJar::from_request_header(
        "session_id=s3cr3t; rt_ref=srv777",
        clock.clone(),
    ));
    let tracker = tracker_over(
        &clock,
        &jar,
        Arc::new(MemoryStore::local()),
        Arc::new(MemoryStore::session()),
    );

    assert_eq!(tracker.get_referral_code().as_deref(), Some("SRV777"));
}
