//! Wall-clock timestamps for persisted records.
//!
//! Timestamps are kept at microsecond precision so that the fixed-width
//! text form used by storage adapters round-trips without loss and sorts
//! lexically in time order.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// UTC timestamp attached to readings, ranges, actuator changes and events.
pub type Timestamp = DateTime<Utc>;

/// Current UTC time truncated to whole microseconds.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 form (`2024-05-01T12:00:00.000000Z`).
#[must_use]
pub fn format(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse any RFC 3339 timestamp into UTC.
///
/// # Errors
///
/// Returns the chrono parse error when `text` is not RFC 3339.
pub fn parse(text: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|ts| ts.to_utc())
}
