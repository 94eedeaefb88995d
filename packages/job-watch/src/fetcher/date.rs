//! Posting date normalization.
//!
//! Listing pages expose posting times in a handful of machine formats. Every
//! record carries the same human-readable form so stored state and messages
//! stay consistent.
//!
//! Older state files hold dates like `21 Dec 2017, 14:5 PM` (24-hour clock,
//! unpadded minutes). They are kept as stored and still parse in
//! [`parse_canonical`], so they sort by time too.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Canonical display format, e.g. `21 Dec 2017, 9:05 AM`.
pub const CANONICAL_FORMAT: &str = "%d %b %Y, %-I:%M %p";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

// Form found in older state files.
const LEGACY_FORMAT: &str = "%d %b %Y, %H:%M %p";

/// Render a raw posting date in [`CANONICAL_FORMAT`].
///
/// Input that matches none of the known formats is returned trimmed but
/// otherwise unchanged.
pub fn normalize_date(raw: &str) -> String {
    match parse_raw(raw) {
        Some(parsed) => parsed.format(CANONICAL_FORMAT).to_string(),
        None => raw.trim().to_string(),
    }
}

/// Parse a date previously produced by [`normalize_date`] or found in an
/// older state file.
pub fn parse_canonical(date: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    NaiveDateTime::parse_from_str(date, CANONICAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(date, LEGACY_FORMAT))
        .ok()
}

fn parse_raw(raw: &str) -> Option<NaiveDateTime> {
    let value = strip_zone_suffix(raw.trim());
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| parse_canonical(value))
}

/// Drop a trailing parenthesized zone label such as `(UTC)`.
fn strip_zone_suffix(value: &str) -> &str {
    match value.rfind('(') {
        Some(idx) if value.ends_with(')') => value[..idx].trim_end(),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_format_with_zone() {
        assert_eq!(
            normalize_date("12/21/2017 9:05 AM (UTC)"),
            "21 Dec 2017, 9:05 AM"
        );
    }

    #[test]
    fn test_iso_formats() {
        assert_eq!(normalize_date("2017-12-21 14:30"), "21 Dec 2017, 2:30 PM");
        assert_eq!(normalize_date("2017-12-21T14:30:00"), "21 Dec 2017, 2:30 PM");
        assert_eq!(
            normalize_date("2017-12-21T14:30:00+10:00"),
            "21 Dec 2017, 2:30 PM"
        );
        assert_eq!(normalize_date("2017-12-21"), "21 Dec 2017, 12:00 AM");
    }

    #[test]
    fn test_canonical_input_is_stable() {
        let once = normalize_date("12/21/2017 9:05 AM");
        assert_eq!(normalize_date(&once), once);
    }

    #[test]
    fn test_unknown_format_is_kept() {
        assert_eq!(normalize_date("  3 days ago "), "3 days ago");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn test_parse_canonical_round_trip() {
        let parsed = parse_canonical("21 Dec 2017, 9:05 AM").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2017-12-21 09:05");
        assert!(parse_canonical("yesterday").is_none());
    }

    #[test]
    fn test_parse_legacy_state_dates() {
        let afternoon = parse_canonical("21 Dec 2017, 14:5 PM").unwrap();
        assert_eq!(afternoon.format("%Y-%m-%d %H:%M").to_string(), "2017-12-21 14:05");

        let morning = parse_canonical("21 Dec 2017, 9:30 AM").unwrap();
        assert!(morning < afternoon);
    }
}
