//! Lenient parsing of stored timestamps.

use jiff::{Timestamp, civil, tz::TimeZone};

/// Parse an RFC 3339 timestamp, a civil date-time or a bare date (both read
/// as UTC). Anything else is `None`.
pub fn parse(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts);
    }
    if let Ok(dt) = raw.parse::<civil::DateTime>() {
        return dt.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    if let Ok(date) = raw.parse::<civil::Date>() {
        return date.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    None
}

/// The stored timestamp, or `now` when it is missing or unreadable.
pub fn or_now(raw: Option<&str>, now: Timestamp) -> Timestamp {
    raw.and_then(parse).unwrap_or(now)
}

/// `Tue, 12 Mar 2024 09:30:00 +0000`
pub fn rfc2822(ts: Timestamp) -> String {
    jiff::fmt::rfc2822::to_string(&ts.to_zoned(TimeZone::UTC)).unwrap_or_else(|_| ts.to_string())
}

/// `March 12, 2024`
pub fn long_date(ts: Timestamp) -> String {
    ts.to_zoned(TimeZone::UTC).strftime("%B %-d, %Y").to_string()
}
