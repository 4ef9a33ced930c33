//! Token records.
//!
//! A [`TokenRecord`] is a bearer token and its expiration instant. The
//! record is owned exclusively by the token store; both fields are
//! always written together, never partially updated.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Grace window applied when judging token validity, in seconds.
///
/// Tolerates clock skew and avoids failing requests issued just before
/// expiry: a token is still considered usable for this long past its
/// `expires_at`.
pub const EXPIRY_GRACE_SECS: i64 = 300;

// ============================================================================
// Token Record
// ============================================================================

/// A bearer token and its expiration instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The token value sent as `Authorization: Bearer <value>`.
    pub value: String,
    /// Instant after which the token is no longer fresh.
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Creates a new record.
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Returns true if the token is usable at `now`.
    ///
    /// Usable means the value is non-empty and `expires_at` is strictly
    /// after `now` minus the grace window. A token expiring exactly at
    /// `now` is therefore usable only because of the grace window.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.value.is_empty() && self.expires_at > now - Duration::seconds(EXPIRY_GRACE_SECS)
    }

    /// Returns true if the token is usable right now.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Returns true if `expires_at` is at or before `now`, with no
    /// grace tolerance.
    ///
    /// The refresh fast path uses this stricter check so renewal starts
    /// as soon as the nominal expiry passes, while in-flight requests
    /// issued inside the grace window still go out with the old token.
    pub fn is_expired_strict_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Returns true if the token is strictly expired right now.
    pub fn is_expired_strict(&self) -> bool {
        self.is_expired_strict_at(Utc::now())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_before_expiry() {
        let now = Utc::now();
        let record = TokenRecord::new("abc", now + Duration::hours(1));
        assert!(record.is_valid_at(now));
        assert!(!record.is_expired_strict_at(now));
    }

    #[test]
    fn test_invalid_past_grace() {
        let now = Utc::now();
        let record = TokenRecord::new("abc", now - Duration::seconds(EXPIRY_GRACE_SECS + 1));
        assert!(!record.is_valid_at(now));
    }

    #[test]
    fn test_within_grace_window() {
        let now = Utc::now();
        let record = TokenRecord::new("abc", now - Duration::seconds(EXPIRY_GRACE_SECS - 1));
        assert!(record.is_valid_at(now));
        assert!(record.is_expired_strict_at(now));
    }

    #[test]
    fn test_expiring_exactly_now_is_strictly_expired() {
        let now = Utc::now();
        let record = TokenRecord::new("abc", now);
        // Strictly expired at the boundary, usable only via the grace window.
        assert!(record.is_expired_strict_at(now));
        assert!(record.is_valid_at(now));
    }

    #[test]
    fn test_empty_value_never_valid() {
        let now = Utc::now();
        let record = TokenRecord::new("", now + Duration::hours(1));
        assert!(!record.is_valid_at(now));
    }

    #[test]
    fn test_serde_round_trip() {
        let record = TokenRecord::new("abc", Utc::now() + Duration::hours(1));
        let json = serde_json::to_string(&record).unwrap();
        let back: TokenRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
