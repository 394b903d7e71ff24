//! Parsing of the time-related form fields.
//!
//! This module turns the raw strings entered by the user into typed values:
//!
//! - [`parse_duration`] reads an `HH:mm` duration (a zero duration means
//!   "all-day")
//! - [`split_start_times`] splits a delimited start-time list
//! - [`parse_start_time`] reads a single start time, interpreting naive
//!   values in the given time zone

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;

use crate::error::{ValidationError, ValidationResult};

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3}):([0-5]\d)(?::([0-5]\d))?$").expect("Invalid duration regex")
});

/// Naive date-time layouts accepted for start times, tried in order.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses a duration written as `HH:mm` (or `HH:mm:ss`).
///
/// Leading and trailing whitespace is ignored. An empty value is reported as
/// [`ValidationError::MissingDuration`].
pub fn parse_duration(input: &str) -> ValidationResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::MissingDuration);
    }

    let caps = DURATION_REGEX
        .captures(input)
        .ok_or_else(|| ValidationError::InvalidDuration(input.to_string()))?;

    let field = |i: usize| -> i64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };

    Ok(Duration::hours(field(1)) + Duration::minutes(field(2)) + Duration::seconds(field(3)))
}

/// Splits a start-time list on `;` or `,`.
///
/// Items are trimmed and empty items are dropped, so `"a; b,"` yields
/// `["a", "b"]`.
pub fn split_start_times(input: &str) -> Vec<String> {
    input
        .split([';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parses a single start time.
///
/// RFC 3339 values keep their own offset. Naive values
/// (`YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD HH:MM[:SS]` or a bare `YYYY-MM-DD`
/// meaning midnight) are interpreted in `tz`. When a local time is
/// ambiguous the earlier instant is used.
pub fn parse_start_time<Tz: TimeZone>(
    input: &str,
    tz: &Tz,
) -> ValidationResult<DateTime<FixedOffset>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ValidationError::InvalidStartTime(input.to_string()))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| ValidationError::NonexistentLocalTime(input.to_string()))
}
