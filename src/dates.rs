//! Date-parsing policy shared by the historical and future-date tools
//!
//! Accepts ISO dates, a few relative words, and year-omitted month-day
//! forms. Relative and year-omitted inputs are resolved against a reference
//! date, which for the public entry point is the current local date — so
//! forecast results depend on the wall clock, a documented property of the
//! system. Unparseable input produces the `Invalid Date Format` refusal
//! before any file access happens.

use chrono::{Duration, Local, NaiveDate};

/// Refusal message returned for unparseable date input
pub const INVALID_DATE_FORMAT: &str = "Invalid Date Format";

/// Parse a date string against the current local date
pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    parse_date_with_reference(input, Local::now().date_naive())
}

/// Parse a date string against an explicit reference date
///
/// Supported forms, tried in order:
/// - `YYYY-MM-DD` and `YYYY/MM/DD`
/// - `today`, `tomorrow`, `yesterday` (case-insensitive)
/// - `March 29` / `29 March` style month-day forms, resolved to the
///   reference date's year
pub fn parse_date_with_reference(input: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(INVALID_DATE_FORMAT.to_string());
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(parsed);
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y/%m/%d") {
        return Ok(parsed);
    }

    match trimmed.to_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    parse_month_day(trimmed, today).ok_or_else(|| INVALID_DATE_FORMAT.to_string())
}

/// Resolve a year-omitted month-day expression against the reference year
fn parse_month_day(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let with_year = format!("{input} {}", chrono::Datelike::year(&today));
    for format in ["%B %d %Y", "%d %B %Y", "%b %d %Y", "%d %b %Y"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(&with_year, format) {
            return Some(parsed);
        }
    }
    None
}
