//! Date formatting for study and trial timestamps.
//!
//! Dates are rendered in the Japanese numeric layout, e.g. `2024/3/7 9:05:02`:
//! year, month, day and hour without padding; minutes and seconds two digits.

use chrono::{DateTime, Local, TimeZone};

const DATE_FORMAT: &str = "%Y/%-m/%-d %-H:%M:%S";

/// Format `date` in its own time zone.
pub fn format_date<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    date.format(DATE_FORMAT).to_string()
}

/// Format `date` after converting it to the local time zone.
pub fn format_date_local<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format_date(&date.with_timezone(&Local))
}

/// Format an optional timestamp, using `-` when absent.
pub fn format_optional<Tz: TimeZone>(date: Option<&DateTime<Tz>>) -> String {
    date.map(format_date_local).unwrap_or_else(|| "-".to_string())
}
