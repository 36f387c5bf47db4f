//! Wire date/time formatting.
//!
//! Date is `DDMMYY`; time is `HHMMSS[.fffffffff]` with up to nanosecond
//! fraction, preserved to at least microsecond resolution on round-trip.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

/// Render a UTC timestamp as (`DDMMYY`, `HHMMSS.fffffffff`).
pub fn format(dt: DateTime<Utc>) -> (String, String) {
    let date = format!("{:02}{:02}{:02}", dt.day(), dt.month(), dt.year() % 100);
    let time = format!(
        "{:02}{:02}{:02}.{:09}",
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.nanosecond()
    );
    (date, time)
}

/// Parse a `DDMMYY` + `HHMMSS[.fffffffff]` pair into a UTC timestamp.
///
/// Years are interpreted as 2000+YY (the protocol has no 20th-century use).
pub fn parse(date: &str, time: &str) -> Option<DateTime<Utc>> {
    if date.len() != 6 {
        return None;
    }
    let day: u32 = date[0..2].parse().ok()?;
    let month: u32 = date[2..4].parse().ok()?;
    let year: i32 = 2000 + date[4..6].parse::<i32>().ok()?;
    let naive_date = NaiveDate::from_ymd_opt(year, month, day)?;

    let (time_part, frac_part) = match time.split_once('.') {
        Some((t, f)) => (t, f),
        None => (time, ""),
    };
    if time_part.len() != 6 {
        return None;
    }
    let hour: u32 = time_part[0..2].parse().ok()?;
    let minute: u32 = time_part[2..4].parse().ok()?;
    let second: u32 = time_part[4..6].parse().ok()?;

    let nanos = if frac_part.is_empty() {
        0
    } else {
        let padded: String = frac_part.chars().chain(std::iter::repeat('0')).take(9).collect();
        padded.parse().ok()?
    };

    let naive_time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
    let naive = NaiveDateTime::new(naive_date, naive_time);
    Some(DateTime::from_naive_utc_and_offset(naive, Utc))
}
