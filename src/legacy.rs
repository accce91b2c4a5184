//! Affiliate-era names for the referral API.
//!
//! # Deprecated
//!
//! This module is deprecated. Use [`ReferralTracker`] instead.
//! Every function here is a one-line delegation:
//!
//! | Old | New |
//! |-----|-----|
//! | `set_affiliate_cookie` | [`ReferralTracker::set_referral_code`] |
//! | `get_affiliate_code` | [`ReferralTracker::get_referral_code`] |
//! | `get_affiliate_metadata` | [`ReferralTracker::get_referral_metadata`] |
//! | `clear_affiliate_code` | [`ReferralTracker::clear_referral_code`] |
//! | `init_affiliate_tracking` | [`ReferralTracker::init_referral_tracking`] |
//! | `with_affiliate_ref` | [`ReferralTracker::with_ref`] |
//! | `is_valid_affiliate_code` | [`is_valid_ref_code`] |

use crate::attribution::InitOutcome;
use crate::metadata::ReferralMetadata;
use crate::tracker::{is_valid_ref_code, ReferralTracker};
use url::Url;

#[deprecated(since = "0.2.0", note = "Use ReferralMetadata instead")]
pub type AffiliateMetadata = ReferralMetadata;

#[deprecated(since = "0.2.0", note = "Use ReferralTracker::set_referral_code instead")]
pub fn set_affiliate_cookie(tracker: &ReferralTracker, code: &str) -> bool {
    tracker.set_referral_code(code)
}

#[deprecated(since = "0.2.0", note = "Use ReferralTracker::get_referral_code instead")]
pub fn get_affiliate_code(tracker: &ReferralTracker) -> Option<String> {
    tracker.get_referral_code()
}

#[deprecated(
    since = "0.2.0",
    note = "Use ReferralTracker::get_referral_metadata instead"
)]
pub fn get_affiliate_metadata(tracker: &ReferralTracker) -> Option<ReferralMetadata> {
    tracker.get_referral_metadata()
}

#[deprecated(since = "0.2.0", note = "Use ReferralTracker::clear_referral_code instead")]
pub fn clear_affiliate_code(tracker: &ReferralTracker) {
    tracker.clear_referral_code()
}

#[deprecated(
    since = "0.2.0",
    note = "Use ReferralTracker::init_referral_tracking instead"
)]
pub fn init_affiliate_tracking(tracker: &ReferralTracker, page: &Url) -> InitOutcome {
    tracker.init_referral_tracking(page)
}

#[deprecated(since = "0.2.0", note = "Use ReferralTracker::with_ref instead")]
pub fn with_affiliate_ref(
    tracker: &ReferralTracker,
    page: &Url,
    url: &str,
    code: Option<&str>,
) -> String {
    tracker.with_ref(page, url, code)
}

#[deprecated(since = "0.2.0", note = "Use is_valid_ref_code instead")]
pub fn is_valid_affiliate_code(code: &str) -> bool {
    is_valid_ref_code(code)
}
