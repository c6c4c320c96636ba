//! Clock helpers shared by the scheduler and the presenter.
//!
//! Prayer times travel as `HH:MM` strings, exactly as the schedule API
//! returns them. Comparisons are same-day only, so no date is carried.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub const MINUTES_PER_DAY: u32 = 1440;

/// Local calendar date as `YYYY-MM-DD`.
pub fn current_date_key() -> String {
    date_key(Local::now().date_naive())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Zero-padded 24-hour clock value.
pub fn format_clock(hours: u32, minutes: u32) -> String {
    format!("{:02}:{:02}", hours, minutes)
}

pub fn clock_of(now: NaiveDateTime) -> String {
    format_clock(now.hour(), now.minute())
}

pub fn minutes_of_day(now: NaiveDateTime) -> u32 {
    now.hour() * 60 + now.minute()
}

/// Minutes since midnight for a `HH:MM` value, `None` if it is not one.
pub fn parse_clock(time: &str) -> Option<u32> {
    let (h, m) = time.trim().split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Clock value `minutes` before `time`, wrapping across midnight.
pub fn offset_minutes_before(time: &str, minutes: u32) -> Option<String> {
    let total = parse_clock(time)?;
    let shifted = (total + MINUTES_PER_DAY - minutes % MINUTES_PER_DAY) % MINUTES_PER_DAY;
    Some(format_clock(shifted / 60, shifted % 60))
}

/// Minutes from `from` until `to`, both minutes of day; wraps to tomorrow.
pub fn minutes_until(from: u32, to: u32) -> u32 {
    (to + MINUTES_PER_DAY - from % MINUTES_PER_DAY) % MINUTES_PER_DAY
}

/// The 00:05 following `now`, always on the next calendar day.
pub fn next_rollover(now: NaiveDateTime) -> NaiveDateTime {
    let tomorrow = now.date() + Duration::days(1);
    tomorrow.and_time(NaiveTime::from_hms_opt(0, 5, 0).unwrap_or(NaiveTime::MIN))
}
