//! Millisecond timestamps, half-open ranges and range-bound parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HOUR_MS: i64 = 3_600_000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("unrecognised date/time: {0:?}")]
    Unrecognised(String),

    #[error("range start {start} must precede end {end}")]
    Empty { start: i64, end: i64 },
}

/// `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self, RangeParseError> {
        if start_ms >= end_ms {
            return Err(RangeParseError::Empty {
                start: start_ms,
                end: end_ms,
            });
        }
        Ok(Self { start_ms, end_ms })
    }

    /// The `window_ms` leading up to and including `now_ms`.
    pub fn trailing(now_ms: i64, window_ms: i64) -> Self {
        Self {
            start_ms: now_ms - window_ms,
            end_ms: now_ms + 1,
        }
    }

    pub fn contains(&self, ts_ms: i64) -> bool {
        ts_ms >= self.start_ms && ts_ms < self.end_ms
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// ISO-8601 with millisecond precision, e.g. `2024-03-01T10:15:00.000Z`.
pub fn to_iso(ts_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.3fZ",
    "%Y-%m-%d %H:%M:%S%.3fZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%SZ",
];

/// Parses one bound of a query range into epoch milliseconds.
///
/// Accepted inputs:
/// - `YYYY-MM-DD`; as an end bound the whole day is included.
/// - `YYYY-MM-DD[ T]HH:MM:SS[.mmm]Z`; as an end bound the following hour is included.
/// - a bare integer of microseconds since the epoch; end bounds extend by an hour.
pub fn parse_range_bound(input: &str, is_end: bool) -> Result<i64, RangeParseError> {
    let s = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ts = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .ok_or_else(|| RangeParseError::Unrecognised(input.to_string()))?;
        return Ok(if is_end { ts + DAY_MS } else { ts });
    }

    let extend = |ts: i64| if is_end { ts + HOUR_MS } else { ts };

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Ok(extend(dt.and_utc().timestamp_millis()));
    }

    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        let micros: i64 = s
            .parse()
            .map_err(|_| RangeParseError::Unrecognised(input.to_string()))?;
        return Ok(extend(micros / 1_000));
    }

    Err(RangeParseError::Unrecognised(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARCH_1: i64 = 1_709_251_200_000;

    #[test]
    fn date_only_end_bound_covers_whole_day() {
        assert_eq!(parse_range_bound("2024-03-01", false), Ok(MARCH_1));
        assert_eq!(parse_range_bound("2024-03-01", true), Ok(MARCH_1 + DAY_MS));
    }

    #[test]
    fn datetime_end_bound_extends_one_hour() {
        let start = MARCH_1 + 10 * HOUR_MS;
        assert_eq!(parse_range_bound("2024-03-01T10:00:00Z", false), Ok(start));
        assert_eq!(parse_range_bound("2024-03-01 10:00:00.000Z", true), Ok(start + HOUR_MS));
    }

    #[test]
    fn fraction_must_be_milliseconds() {
        let start = MARCH_1 + 10 * HOUR_MS;
        assert_eq!(parse_range_bound("2024-03-01T10:00:00.250Z", false), Ok(start + 250));
        assert!(parse_range_bound("2024-03-01T10:00:00.5Z", false).is_err());
        assert!(parse_range_bound("2024-03-01T10:00:00.123456Z", false).is_err());
    }

    #[test]
    fn integer_bound_is_microseconds() {
        assert_eq!(parse_range_bound("1709251200000000", false), Ok(MARCH_1));
        assert_eq!(parse_range_bound("1709251200000000", true), Ok(MARCH_1 + HOUR_MS));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            parse_range_bound("yesterday", false),
            Err(RangeParseError::Unrecognised(_))
        ));
        assert!(parse_range_bound("", true).is_err());
    }

    #[test]
    fn range_is_half_open() {
        let r = TimeRange::new(10, 20).unwrap();
        assert!(r.contains(10));
        assert!(!r.contains(20));
        assert!(TimeRange::new(20, 20).is_err());
    }

    #[test]
    fn iso_rendering_uses_millis() {
        assert_eq!(to_iso(MARCH_1 + 1), "2024-03-01T00:00:00.001Z");
    }
}
