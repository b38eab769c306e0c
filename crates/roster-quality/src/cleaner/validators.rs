//! Per-field validators.
//!
//! Every validator is total: it returns the normalized value, or `None` when
//! the input is not acceptable. Invalid input is an expected outcome, not an
//! error.

use crate::utils::{clean_numeric_string, is_numeric_dtype};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

const DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

// Month-first is tried before day-first for slash dates.
const DATE_FORMATS: [&str; 16] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d-%b-%Y",
];

// Plausible epoch ranges for numeric dates.
const EPOCH_SECONDS: std::ops::Range<i64> = 1_000_000_000..2_000_000_000;
const EPOCH_MILLIS: std::ops::Range<i64> = 1_000_000_000_000..2_000_000_000_000;

/// A single cell as seen by the validators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    /// Null, or a NaN number.
    Missing,
    Text(&'a str),
    Number(f64),
    /// A value that is already a date or datetime.
    Timestamp(NaiveDateTime),
    /// Booleans and nested values.
    Other,
}

impl<'a> From<&'a AnyValue<'_>> for RawValue<'a> {
    fn from(value: &'a AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => RawValue::Missing,
            AnyValue::String(s) => RawValue::Text(s),
            AnyValue::StringOwned(s) => RawValue::Text(s.as_str()),
            AnyValue::Date(days) => DateTime::from_timestamp(i64::from(*days) * 86_400, 0)
                .map(|dt| RawValue::Timestamp(dt.naive_utc()))
                .unwrap_or(RawValue::Other),
            AnyValue::Datetime(v, unit, _) => datetime_from_unit(*v, *unit)
                .map(RawValue::Timestamp)
                .unwrap_or(RawValue::Other),
            AnyValue::DatetimeOwned(v, unit, _) => datetime_from_unit(*v, *unit)
                .map(RawValue::Timestamp)
                .unwrap_or(RawValue::Other),
            other if is_numeric_dtype(&other.dtype()) => match other.extract::<f64>() {
                Some(n) if n.is_nan() => RawValue::Missing,
                Some(n) => RawValue::Number(n),
                None => RawValue::Missing,
            },
            _ => RawValue::Other,
        }
    }
}

fn datetime_from_unit(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    dt.map(|dt| dt.naive_utc())
}

/// Trim, lowercase and check an email address.
pub fn email(raw: RawValue<'_>) -> Option<String> {
    let RawValue::Text(text) = raw else {
        return None;
    };
    let normalized = text.trim().to_lowercase();
    EMAIL_PATTERN.is_match(&normalized).then_some(normalized)
}

/// Keep digits and `+`, then require 7 to 15 digits after an optional leading `+`.
///
/// The normalized value keeps the leading `+`.
pub fn phone(raw: RawValue<'_>) -> Option<String> {
    let RawValue::Text(text) = raw else {
        return None;
    };
    let stripped: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    let digits = stripped.strip_prefix('+').unwrap_or(&stripped);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len());
    valid.then_some(stripped)
}

/// Parse a non-negative amount, tolerating `,` and `$` in text input.
pub fn numeric(raw: RawValue<'_>) -> Option<f64> {
    let value = match raw {
        RawValue::Number(n) => n,
        RawValue::Text(text) => clean_numeric_string(text).parse::<f64>().ok()?,
        RawValue::Missing | RawValue::Timestamp(_) | RawValue::Other => return None,
    };
    // NaN fails this comparison too
    (value >= 0.0).then_some(value)
}

/// Permissive date parsing with naive calendar semantics.
///
/// Numbers are read as Unix seconds or milliseconds only within a plausible
/// range; any other number is invalid rather than taken as nanoseconds.
pub fn date(raw: RawValue<'_>) -> Option<NaiveDateTime> {
    match raw {
        RawValue::Timestamp(dt) => Some(dt),
        RawValue::Text(text) => parse_date_text(text),
        RawValue::Number(n) => parse_epoch(n),
        RawValue::Missing | RawValue::Other => None,
    }
}

/// Trim optional free text; blank or non-text becomes absent.
pub fn text(raw: RawValue<'_>) -> Option<String> {
    let RawValue::Text(text) = raw else {
        return None;
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_date_text(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }

    parse_compact_date(trimmed)
}

/// `YYYYMMDD` with no separators.
fn parse_compact_date(value: &str) -> Option<NaiveDateTime> {
    if value.len() != 8 || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year = value[0..4].parse::<i32>().ok()?;
    let month = value[4..6].parse::<u32>().ok()?;
    let day = value[6..8].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_epoch(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    let ts = value as i64;
    let dt = if EPOCH_SECONDS.contains(&ts) {
        DateTime::from_timestamp(ts, 0)
    } else if EPOCH_MILLIS.contains(&ts) {
        DateTime::from_timestamp_millis(ts)
    } else {
        None
    };
    dt.map(|dt| dt.naive_utc())
}
