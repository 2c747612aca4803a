//! Time utilities: "today" in the user's timezone and deadline parsing.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::ValidationError;

/// Parse an IANA timezone like "America/Chicago".
pub fn parse_timezone(tz: &str) -> Result<Tz, String> {
    tz.trim()
        .parse::<Tz>()
        .map_err(|_| format!("invalid timezone: {tz}"))
}

/// Calendar date of `now` as seen in `tz`.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Parse a deadline like "2026-02-20".
pub fn parse_deadline(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(s.trim().to_string()))
}
