use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Format used for timestamps in every exported file.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse a meter timestamp into a naive wall-clock [`NaiveDateTime`].
///
/// Handles:
/// * RFC 3339 with a `Z` suffix or explicit offset. The offset is dropped and
///   the local wall-clock time is kept, so the calendar day is the one
///   written in the file.
/// * ISO 8601 date-times with `T` or a space separator, with or without
///   seconds and fractional seconds.
/// * Bare `YYYY-MM-DD` dates (interpreted as midnight).
/// * `DD/MM/YYYY HH:MM[:SS]` and `YYYY/MM/DD HH:MM[:SS]`.
///
/// Returns `None` for empty strings or unrecognised formats.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
    let normalised = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        s.to_string()
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.naive_local());
    }

    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];

    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    debug!("could not parse timestamp string \"{}\"", s);
    None
}

/// Render a timestamp the way the cleaned-data export writes it.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(EXPORT_TIMESTAMP_FORMAT).to_string()
}

/// Hour of day (0-23) of a reading timestamp.
pub fn hour_of_day(ts: &NaiveDateTime) -> u32 {
    ts.hour()
}

// ── IsoWeekKey ────────────────────────────────────────────────────────────────

/// An ISO 8601 week: weeks start on Monday and belong to the ISO year that
/// contains their Thursday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IsoWeekKey {
    pub year: i32,
    pub week: u32,
}

impl IsoWeekKey {
    /// The ISO week containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for IsoWeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}
