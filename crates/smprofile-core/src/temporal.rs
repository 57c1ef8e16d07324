//! # Temporal Format Checks
//!
//! Text-level checks for the two timestamp types profiles declare:
//!
//! - **DateTime**: any ISO 8601 date-time. Producers emit both offset-bearing
//!   (`2026-01-16T08:02:37.789055-06:00`) and naive local forms
//!   (`2026-01-16T08:00:00`), so both are accepted.
//! - **UtcTime**: an RFC 3339 instant that ends with the `Z` suffix. Explicit
//!   offsets, including `+00:00`, are rejected.
//!
//! These checks back the strict format policy. Under the lenient policy the
//! schema crate only requires a string (and the `Z` suffix for UtcTime).

use chrono::{DateTime, NaiveDateTime};

/// Naive (offset-free) ISO 8601 layouts, with and without fractional seconds.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Returns true if `s` parses as an ISO 8601 date-time, with or without an offset.
pub fn is_iso8601_datetime(s: &str) -> bool {
    if DateTime::parse_from_rfc3339(s).is_ok() {
        return true;
    }
    NAIVE_LAYOUTS
        .iter()
        .any(|layout| NaiveDateTime::parse_from_str(s, layout).is_ok())
}

/// Returns true if `s` is an RFC 3339 timestamp with the `Z` suffix.
pub fn is_utc_timestamp(s: &str) -> bool {
    s.ends_with('Z') && DateTime::parse_from_rfc3339(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- is_iso8601_datetime ----

    #[test]
    fn test_datetime_with_offset() {
        assert!(is_iso8601_datetime("2026-01-16T08:02:37.789055-06:00"));
        assert!(is_iso8601_datetime("2026-01-16T08:02:37+05:30"));
    }

    #[test]
    fn test_datetime_utc() {
        assert!(is_iso8601_datetime("2026-01-16T14:02:37Z"));
    }

    #[test]
    fn test_datetime_naive() {
        assert!(is_iso8601_datetime("2026-01-16T08:00:00"));
        assert!(is_iso8601_datetime("2026-01-16T08:00:00.5"));
    }

    #[test]
    fn test_datetime_rejects_garbage() {
        assert!(!is_iso8601_datetime("yesterday"));
        assert!(!is_iso8601_datetime("2026-01-16"));
        assert!(!is_iso8601_datetime("2026-13-16T08:00:00"));
        assert!(!is_iso8601_datetime(""));
    }

    // ---- is_utc_timestamp ----

    #[test]
    fn test_utc_z_suffix_accepted() {
        assert!(is_utc_timestamp("2024-01-01T00:00:00Z"));
        assert!(is_utc_timestamp("2026-01-16T14:02:37.789055Z"));
    }

    #[test]
    fn test_utc_missing_z_rejected() {
        assert!(!is_utc_timestamp("2024-01-01T00:00:00"));
    }

    #[test]
    fn test_utc_explicit_offset_rejected() {
        assert!(!is_utc_timestamp("2024-01-01T00:00:00+00:00"));
        assert!(!is_utc_timestamp("2024-01-01T00:00:00-04:00"));
    }

    #[test]
    fn test_utc_z_without_valid_timestamp_rejected() {
        assert!(!is_utc_timestamp("Z"));
        assert!(!is_utc_timestamp("not a time Z"));
    }
}
