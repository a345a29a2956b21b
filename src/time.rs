//! Time utilities for the board model
//!
//! Timestamps serialize with a single fixed pattern and durations are
//! day-count floats everywhere. Natural-language parsing accepts either a
//! concrete datetime or an offset from a reference moment ("in 2 days",
//! "3 hours ago").

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Fixed serialization pattern for all timestamps.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ%z";

const SECS_PER_DAY: f64 = 86_400.0;
const MINUTES_PER_DAY: f64 = 1_440.0;

#[derive(Debug, Error, PartialEq)]
pub enum TimeError {
    #[error("Invalid datetime: '{0}'")]
    InvalidDatetime(String),

    #[error("Invalid duration: '{0}'")]
    InvalidDuration(String),
}

/// Returns the current time.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Duration (in days) between two datetimes. Negative if `b` precedes `a`.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds() as f64 / (SECS_PER_DAY * 1000.0)
}

/// Formats a timestamp with the fixed pattern.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(TIME_FORMAT).to_string()
}

/// Parses a timestamp in the fixed pattern.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimeError> {
    DateTime::parse_from_str(s, TIME_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| TimeError::InvalidDatetime(s.to_string()))
}

/// Parses a natural datetime string relative to `now`.
///
/// Accepts the fixed pattern, RFC 3339, bare dates (`2024-03-01` or
/// `3/1/24`), and offsets from `now` such as "in 2 days", "three hours ago",
/// or "1 week from now".
pub fn parse_datetime(s: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TimeError::InvalidDatetime(s.to_string()));
    }

    if let Ok(dt) = parse_timestamp(s) {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc());
            }
        }
    }

    // Fall back to a duration offset from the reference moment.
    let lower = s.to_lowercase();
    let is_past = lower.ends_with(" ago");
    let mut rel = lower.as_str();
    rel = rel.strip_prefix("in ").unwrap_or(rel);
    rel = rel.strip_suffix(" from now").unwrap_or(rel);
    rel = rel.strip_suffix(" ago").unwrap_or(rel);

    let days =
        parse_duration_days(rel.trim()).map_err(|_| TimeError::InvalidDatetime(s.to_string()))?;
    let offset = chrono::Duration::milliseconds((days * SECS_PER_DAY * 1000.0).round() as i64);
    Ok(if is_past { now - offset } else { now + offset })
}

/// Parses a duration string into a day count.
///
/// Accepts one or more `<number> <unit>` pairs ("90 minutes", "1 week 2
/// days"). Number words zero through nine are recognized. Months count as
/// 30 days and years as 365.
pub fn parse_duration_days(s: &str) -> Result<f64, TimeError> {
    let normalized = convert_number_words(&s.trim().to_lowercase());
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return Err(TimeError::InvalidDuration(s.to_string()));
    }

    let mut days = 0.0;
    for pair in tokens.chunks(2) {
        let amount: f64 = pair[0]
            .parse()
            .map_err(|_| TimeError::InvalidDuration(s.to_string()))?;
        if amount < 0.0 {
            return Err(TimeError::InvalidDuration(s.to_string()));
        }
        let per_day = unit_days(pair[1]).ok_or_else(|| TimeError::InvalidDuration(s.to_string()))?;
        days += amount * per_day;
    }
    Ok(days)
}

fn unit_days(unit: &str) -> Option<f64> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1.0 / SECS_PER_DAY),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(1.0 / MINUTES_PER_DAY),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(1.0 / 24.0),
        "d" | "day" | "days" => Some(1.0),
        "w" | "wk" | "wks" | "week" | "weeks" => Some(7.0),
        "mo" | "month" | "months" => Some(30.0),
        "y" | "yr" | "yrs" | "year" | "years" => Some(365.0),
        _ => None,
    }
}

fn convert_number_words(s: &str) -> String {
    s.split_whitespace()
        .map(|token| match token {
            "zero" => "0",
            "one" | "a" | "an" => "1",
            "two" => "2",
            "three" => "3",
            "four" => "4",
            "five" => "5",
            "six" => "6",
            "seven" => "7",
            "eight" => "8",
            "nine" => "9",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders a day-count duration as a human-readable string, rounded to the
/// nearest minute.
pub fn human_duration(days: f64) -> String {
    let total_seconds = (days * SECS_PER_DAY).round() as i64;
    if total_seconds < 60 {
        return pluralize(total_seconds, "second");
    }

    let mut minutes = (days * MINUTES_PER_DAY).round() as i64;
    const UNITS: [(&str, i64); 6] = [
        ("year", 525_600),
        ("month", 43_200),
        ("week", 10_080),
        ("day", 1_440),
        ("hour", 60),
        ("minute", 1),
    ];

    let mut parts = Vec::new();
    for (name, per_unit) in UNITS {
        let count = minutes / per_unit;
        if count > 0 {
            parts.push(pluralize(count, name));
            minutes -= count * per_unit;
        }
    }
    parts.join(" ")
}

fn pluralize(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Serde adapter for required timestamps in the fixed pattern.
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(*dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional timestamps in the fixed pattern.
pub mod timestamp_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_str(&super::format_timestamp(*dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            Some(s) => super::parse_timestamp(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
