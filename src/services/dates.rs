//! Parsing of the free-text creation dates stored in the job database.
//!
//! The database holds values like `"Dec 21, 25, 8:36 PM"`: month and day,
//! a two-digit year, then a time of day that the gallery does not use.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("date is empty")]
    Empty,
    #[error("date `{0}` has no year segment")]
    MissingYear(String),
    #[error("date `{0}` does not carry a two-digit year")]
    BadYear(String),
    #[error("cannot parse date `{value}`: {reason}")]
    Invalid { value: String, reason: String },
}

/// What a caller wants when a date cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFallback {
    /// Report the failure and leave the target alone.
    Skip,
    /// Substitute a fixed date.
    Default(NaiveDate),
}

impl DateFallback {
    /// Parse `raw` and apply this policy to a failure.
    pub fn resolve(&self, raw: Option<&str>) -> Result<NaiveDate, DateParseError> {
        let parsed = raw.ok_or(DateParseError::Empty).and_then(parse_job_date);
        match (self, parsed) {
            (_, Ok(date)) => Ok(date),
            (DateFallback::Skip, Err(err)) => Err(err),
            (DateFallback::Default(date), Err(_)) => Ok(*date),
        }
    }
}

/// Date substituted by a rebuild when a row's date is missing or unreadable.
pub fn rebuild_fallback_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 10).unwrap_or_default()
}

/// Parse `"<Mon> <Day>, <YY>, <time>"` into a calendar date.
///
/// Only the first two comma-separated segments are read; the time of day is
/// discarded.
pub fn parse_job_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    if raw.trim().is_empty() {
        return Err(DateParseError::Empty);
    }

    let mut parts = raw.split(',');
    let month_day = parts.next().unwrap_or_default().trim();
    let year = parts
        .next()
        .map(str::trim)
        .ok_or_else(|| DateParseError::MissingYear(raw.to_string()))?;

    if year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateParseError::BadYear(raw.to_string()));
    }

    NaiveDate::parse_from_str(&format!("{month_day}, 20{year}"), "%b %d, %Y").map_err(|err| {
        DateParseError::Invalid {
            value: raw.to_string(),
            reason: err.to_string(),
        }
    })
}

/// Render a date the way the gallery stores it.
pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
