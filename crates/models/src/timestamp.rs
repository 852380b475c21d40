//! `createdAt` is stored the way browsers print `Date#toISOString`:
//! millisecond precision with a `Z` suffix. It is kept as text so a value
//! this crate cannot parse still round-trips unchanged.

use chrono::{DateTime, SecondsFormat, Utc};

pub fn format(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
}
