//! Base types and error handling.
//!
//! Provides foundational types shared by every tier:
//! - [`TrackerError`](trackererror::TrackerError): storage, code and configuration errors
//! - [`Clock`](clock::Clock): injectable time source for TTL handling

pub mod clock;
pub mod context;
pub mod trackererror;
