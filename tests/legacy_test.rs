//! The deprecated affiliate-era names must behave exactly like the
//! canonical API.
#![allow(deprecated)]

use reftrack::legacy::{
    clear_affiliate_code, get_affiliate_code, get_affiliate_metadata, init_affiliate_tracking,
    is_valid_affiliate_code, set_affiliate_cookie, with_affiliate_ref,
};
use reftrack::tracker::{is_valid_ref_code, ReferralTracker};
use url::Url;

fn page(s: &str) -> Url {
    Url::parse(s).unwrap()
}

#[test]
fn test_validation_alias_matches() {
    for code in ["ABC123", "abc123", "AB12C", "AB-123", "ABCDEFGHIJKLMNOPQ", ""] {
        assert_eq!(is_valid_affiliate_code(code), is_valid_ref_code(code), "{}", code);
    }
}

#[test]
fn test_aliases_share_state_with_canonical_api() {
    let tracker = ReferralTracker::in_memory();

    set_affiliate_cookie(&tracker, "abc123");
    assert_eq!(tracker.get_referral_code().as_deref(), Some("ABC123"));
    assert_eq!(get_affiliate_code(&tracker), tracker.get_referral_code());
    assert_eq!(get_affiliate_metadata(&tracker), tracker.get_referral_metadata());

    clear_affiliate_code(&tracker);
    assert_eq!(tracker.get_referral_code(), None);
}

#[test]
fn test_init_alias_enforces_first_touch() {
    let legacy = ReferralTracker::in_memory();
    let canonical = ReferralTracker::in_memory();

    for url in ["https://rentably.de/?ref=AAA111", "https://rentably.de/?ref=BBB222"] {
        let a = init_affiliate_tracking(&legacy, &page(url));
        let b = canonical.init_referral_tracking(&page(url));
        assert_eq!(a, b);
    }
    assert_eq!(get_affiliate_code(&legacy).as_deref(), Some("AAA111"));
}

#[test]
fn test_link_alias_matches() {
    let tracker = ReferralTracker::in_memory();
    let here = page("https://rentably.de/");
    tracker.set_referral_code("XYZ999");

    for target in ["/funktionen", "/funktionen?x=1", "/dashboard", "#top", "https://external.example/"] {
        assert_eq!(
            with_affiliate_ref(&tracker, &here, target, None),
            tracker.with_ref(&here, target, None)
        );
    }
}
