//! Publication time normalization.
//!
//! Feed entries carry their publication time in several shapes: a
//! structured breakdown of the published or updated time, a free-text
//! string, or nothing at all. [`normalize`] folds them into one UTC instant.

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Timelike, Utc,
};

use crate::provider::FeedEntry;

/// Calendar breakdown of a feed-provided time, always interpreted as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeParts {
    /// `None` when the fields do not name a real instant (month 13, Feb 30, ...).
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        )
        .single()
    }
}

impl From<DateTime<Utc>> for TimeParts {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M:%S %z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a free-text timestamp. Values without an offset are taken as UTC.
pub fn parse_free_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Canonical publication instant for `entry`.
///
/// Tries the published breakdown, the updated breakdown, then the free-text
/// published string, and falls back to `now`. Never fails. The result is
/// truncated to microseconds.
pub fn normalize(entry: &FeedEntry, now: DateTime<Utc>) -> DateTime<Utc> {
    entry
        .published
        .and_then(|parts| parts.to_utc())
        .or_else(|| entry.updated.and_then(|parts| parts.to_utc()))
        .or_else(|| entry.published_text.as_deref().and_then(parse_free_text))
        .unwrap_or(now)
        .trunc_subsecs(6)
}
