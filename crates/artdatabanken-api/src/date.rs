//! Lenient parsing of the date strings used in filters and responses

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a date or timestamp string into local wall-clock time.
///
/// Accepts RFC 3339 timestamps (the offset is kept as wall-clock time, not
/// converted), naive timestamps with minute or second resolution, and plain
/// `YYYY-MM-DD` dates, which map to midnight. Returns `None` for anything else.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Order two date strings in time, `None` if either is unreadable.
///
/// Two RFC 3339 timestamps are compared as instants, so differing offsets are
/// accounted for. Anything else is compared as wall-clock time.
pub fn compare_timestamps(a: &str, b: &str) -> Option<Ordering> {
    if let (Ok(a), Ok(b)) = (
        DateTime::parse_from_rfc3339(a.trim()),
        DateTime::parse_from_rfc3339(b.trim()),
    ) {
        return Some(a.cmp(&b));
    }
    Some(parse_timestamp(a)?.cmp(&parse_timestamp(b)?))
}
