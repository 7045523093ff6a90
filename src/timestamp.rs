//! Timestamp normalization for cutoff options and local-time display.
//!
//! Stored transcript timestamps are UTC ISO 8601 strings with millisecond
//! precision, chosen so lexicographic comparison equals chronological
//! comparison. User-supplied cutoffs are normalized into the same shape
//! before any comparison happens.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SalvageError};

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid literal regex"));
static DATE_MINUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}$").expect("valid literal regex"));
static DATE_SECOND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}$").expect("valid literal regex")
});
static TRAILING_OFFSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+-]\d{2}:\d{2}$").expect("valid literal regex"));

/// Normalize flexible user input into a UTC timestamp string.
///
/// Accepted shapes:
/// - `YYYY-MM-DD` — end of that day in local time
/// - `YYYY-MM-DD HH:MM` — end of that minute in local time
/// - `YYYY-MM-DD HH:MM:SS` — end of that second in local time
/// - full ISO 8601 with `Z` or an explicit offset, honored as-is
///
/// The result is formatted `YYYY-MM-DDTHH:MM:SS.mmmZ` so it sorts
/// lexicographically against stored transcript timestamps.
pub fn normalize_timestamp(input: &str) -> Result<String> {
    let s = input.trim();
    if s.is_empty() {
        return Err(SalvageError::bad_timestamp(input, "empty timestamp"));
    }

    // Timezone-aware forms are honored as-is.
    if s.contains('Z') || TRAILING_OFFSET_RE.is_match(s) {
        return parse_aware(s);
    }

    // Bare forms are local time, rounded up to the end of the given unit.
    if DATE_RE.is_match(s) {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| SalvageError::bad_timestamp(s, e.to_string()))?;
        let dt = date
            .and_hms_micro_opt(23, 59, 59, 999_000)
            .expect("23:59:59.999000 is a valid wall-clock time");
        return local_to_utc(dt, s);
    }

    if DATE_MINUTE_RE.is_match(s) {
        let dt = NaiveDateTime::parse_from_str(&s.replace('T', " "), "%Y-%m-%d %H:%M")
            .map_err(|e| SalvageError::bad_timestamp(s, e.to_string()))?;
        let dt = dt
            .with_second(59)
            .and_then(|dt| dt.with_nanosecond(999_000_000))
            .expect("59.999000 is a valid second");
        return local_to_utc(dt, s);
    }

    if DATE_SECOND_RE.is_match(s) {
        let dt = NaiveDateTime::parse_from_str(&s.replace('T', " "), "%Y-%m-%d %H:%M:%S")
            .map_err(|e| SalvageError::bad_timestamp(s, e.to_string()))?;
        let dt = dt
            .with_nanosecond(999_000_000)
            .expect("999000 microseconds is in range");
        return local_to_utc(dt, s);
    }

    Err(SalvageError::bad_timestamp(
        s,
        "expected YYYY-MM-DD, YYYY-MM-DD HH:MM, YYYY-MM-DD HH:MM:SS, \
         or full ISO 8601 with timezone (e.g. 2026-01-30T15:00:00Z)",
    ))
}

/// Convert a stored UTC timestamp to a local-time display string.
///
/// Returns the raw input on parse failure so tables never lose a row.
#[must_use]
pub fn utc_to_local(utc_ts: &str) -> String {
    utc_to_local_format(utc_ts, "%Y-%m-%d %H:%M")
}

/// Convert a stored UTC timestamp to local time with a custom format.
#[must_use]
pub fn utc_to_local_format(utc_ts: &str, format: &str) -> String {
    match DateTime::parse_from_rfc3339(utc_ts) {
        Ok(dt) => dt.with_timezone(&Local).format(format).to_string(),
        Err(_) => utc_ts.to_string(),
    }
}

/// Format a UTC timestamp together with its local rendering.
///
/// Example: `"2026-01-30T14:00:00.000Z (2026-01-30 15:00 local)"`.
#[must_use]
pub fn format_local_confirmation(utc_ts: &str) -> String {
    let local = utc_to_local(utc_ts);
    if local == utc_ts {
        utc_ts.to_string()
    } else {
        format!("{utc_ts} ({local} local)")
    }
}

fn parse_aware(s: &str) -> Result<String> {
    let normalized = s.replace(' ', "T").replace('Z', "+00:00");
    const FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%dT%H:%M%:z",
    ];
    for format in FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Ok(format_utc(dt.with_timezone(&Utc)));
        }
    }
    Err(SalvageError::bad_timestamp(
        s,
        "cannot parse timestamp with timezone",
    ))
}

fn local_to_utc(naive: NaiveDateTime, input: &str) -> Result<String> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            Ok(format_utc(dt.with_timezone(&Utc)))
        }
        LocalResult::None => Err(SalvageError::bad_timestamp(
            input,
            "time does not exist in the local timezone (DST gap)",
        )),
    }
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
