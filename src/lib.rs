//! # reftrack
//!
//! Referral attribution tracking for web front-ends.
//!
//! `reftrack` decides which referral code "owns" a visitor, keeps that
//! decision alive across page loads and browser restarts, and carries the
//! code along internal navigation.
//!
//! ## Features
//!
//! - **First-touch attribution**: a later, different `?ref=` never replaces
//!   a live attribution; the same code refreshes its 30-day TTL
//! - **Redundant storage**: primary and legacy cookies plus primary and
//!   legacy metadata entries in durable and session storage, each failing
//!   independently
//! - **Link rewriting**: appends `ref=` to internal links, skipping anchors,
//!   `mailto:`/`tel:`, external hosts and excluded routes
//! - **Legacy names**: deprecated affiliate-era aliases for existing callers
//!
//! ## Quick Start
//!
//! ```rust
//! use reftrack::tracker::ReferralTracker;
//! use url::Url;
//!
//! let tracker = ReferralTracker::in_memory();
//! let page = Url::parse("https://rentably.de/?ref=xyz999").unwrap();
//! tracker.init_referral_tracking(&page);
//!
//! // Later, at signup:
//! assert_eq!(tracker.get_referral_code().as_deref(), Some("XYZ999"));
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Errors, error context helpers and clocks
//! - [`code`] - Referral code validation
//! - [`config`] - Tracker configuration
//! - [`metadata`] - Persisted attribution records
//! - [`storage`] - Cookie jar, key/value stores and the tier chain
//! - [`attribution`] - First-touch policy
//! - [`rewrite`] - Outbound link rewriting
//! - [`tracker`] - The public API facade
//! - [`legacy`] - Deprecated affiliate-era names

pub mod attribution;
pub mod base;
pub mod code;
pub mod config;
pub mod legacy;
pub mod metadata;
pub mod rewrite;
pub mod storage;
pub mod tracker;
