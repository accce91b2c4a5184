//! Referral code validation and normalization.
//!
//! A referral code is 6 to 16 ASCII alphanumeric characters. Input is
//! accepted in any case; the canonical form is uppercase.

use crate::base::trackererror::TrackerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const MIN_CODE_LEN: usize = 6;
pub const MAX_CODE_LEN: usize = 16;

/// Returns true iff `code` matches `^[A-Z0-9]{6,16}$` case-insensitively.
///
/// No trimming happens here; surrounding whitespace makes a code invalid.
pub fn is_valid(code: &str) -> bool {
    (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// A validated, uppercase referral code.
///
/// The only way to obtain one is through validation, so anything holding a
/// `RefCode` may be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefCode(String);

impl RefCode {
    /// Trim, validate and uppercase `raw`.
    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let trimmed = raw.trim();
        if !is_valid(trimmed) {
            return Err(TrackerError::InvalidCode);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Like [`RefCode::parse`], discarding the error.
    pub fn normalize(raw: &str) -> Option<Self> {
        Self::parse(raw).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RefCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RefCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for RefCode {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq<str> for RefCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RefCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for RefCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RefCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RefCode::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_boundary_lengths() {
        assert!(is_valid("ABC123"));
        assert!(is_valid("ABCDEFGH12345678"));
        assert!(is_valid("abc123"));
    }

    #[test]
    fn test_rejects_bad_lengths_and_characters() {
        assert!(!is_valid("AB12C"));
        assert!(!is_valid("ABCDEFGH123456789"));
        assert!(!is_valid("AB-123"));
        assert!(!is_valid(""));
        assert!(!is_valid(" ABC123"));
        // Non-ASCII letters are not alphanumeric for our purposes.
        assert!(!is_valid("ÄBC123"));
    }

    #[test]
    fn test_parse_trims_and_uppercases() {
        let code = RefCode::parse("  abc123 ").unwrap();
        assert_eq!(code.as_str(), "ABC123");
        assert_eq!(code, "ABC123");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(RefCode::parse("AB-123"), Err(TrackerError::InvalidCode));
        assert!(RefCode::normalize("short").is_none());
    }

    #[test]
    fn test_deserialize_revalidates() {
        let ok: RefCode = serde_json::from_str("\"xyz999\"").unwrap();
        assert_eq!(ok.as_str(), "XYZ999");

        let bad: Result<RefCode, _> = serde_json::from_str("\"no\"");
        assert!(bad.is_err());
    }
}
