//! Date/time helpers shared by storage and feed rendering.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::{OarssError, Result};

/// Format a UTC timestamp the way it is stored in the database.
pub fn to_stored(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp (RFC 3339 or SQLite `YYYY-MM-DD HH:MM:SS`).
///
/// Empty or unparseable values yield `None`.
pub fn parse_stored(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a `YYYYMMDD` day into the stored form of that day's first instant (UTC).
pub fn parse_day_bound(day: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(day, "%Y%m%d")
        .map_err(|_| OarssError::Validation(format!("invalid date '{day}', expected YYYYMMDD")))?;
    let start = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| OarssError::Validation(format!("invalid date '{day}'")))?
        .and_utc();
    Ok(to_stored(&start))
}

/// RFC 2822 date used by RSS `pubDate` and `lastBuildDate`.
pub fn to_rfc2822(dt: &DateTime<Utc>) -> String {
    dt.to_rfc2822()
}

/// RFC 3339 date used by JSON Feed and the API.
pub fn to_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
