//! Temporal range used for temporal filtering of rendered layers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A date-time range. An unset bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateTimeRange {
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateTimeRange {
    pub fn new(begin: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { begin, end }
    }

    /// True when both bounds are open.
    pub fn is_infinite(&self) -> bool {
        self.begin.is_none() && self.end.is_none()
    }

    /// Whether `instant` falls inside the range (bounds inclusive).
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.begin.map_or(true, |b| *instant >= b) && self.end.map_or(true, |e| *instant <= e)
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (with offset) as well as offset-less timestamps, which
/// are taken to be UTC. Fractional seconds are optional. Anything else
/// yields `None`.
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.and_utc())
}
