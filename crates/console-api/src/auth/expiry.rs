//! Expiry timestamp parsing.
//!
//! Timestamps that cannot be parsed are treated as the Unix epoch, which
//! makes them expired and due for refresh.

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 (or RFC 2822) timestamp.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Instant an expiry refers to, or the epoch when unparsable.
pub fn expiry_instant(value: &str) -> DateTime<Utc> {
    parse_timestamp(value).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// `now >= expiry`, with unparsable expiries counted as expired.
pub fn is_expired_at(value: &str, now: DateTime<Utc>) -> bool {
    expiry_instant(value) <= now
}

pub fn is_expired(value: &str) -> bool {
    is_expired_at(value, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_future_is_not_expired() {
        let now = Utc::now();
        let expiry = (now + Duration::hours(1)).to_rfc3339();
        assert!(!is_expired_at(&expiry, now));
    }

    #[test]
    fn test_past_and_exact_instant_are_expired() {
        let now = Utc::now();
        assert!(is_expired_at(&(now - Duration::seconds(1)).to_rfc3339(), now));
        assert!(is_expired_at(&now.to_rfc3339(), now));
    }

    #[test]
    fn test_unparsable_is_expired() {
        let now = Utc::now();
        assert!(is_expired_at("", now));
        assert!(is_expired_at("tomorrow", now));
        assert!(is_expired_at("2030-13-45T99:00:00Z", now));
        assert_eq!(expiry_instant("garbage"), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_offsets_and_rfc2822() {
        let parsed = parse_timestamp("2030-01-01T02:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2030-01-01T00:00:00+00:00");

        let parsed = parse_timestamp("Tue, 01 Jan 2030 00:00:00 GMT").unwrap();
        assert_eq!(parsed, parse_timestamp("2030-01-01T00:00:00Z").unwrap());
    }
}
