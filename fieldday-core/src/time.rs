//! Time utilities: time-of-day parsing, interval overlap, and calendar windows.
//!
//! Everything here is pure. Times of day are carried as `NaiveTime` on records and
//! as minute offsets from midnight (`i32`) inside the slot arithmetic, so an
//! interval may run past 24:00 without wrapping.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Timelike, Weekday};

use crate::error::{CoreError, Result};

pub const MINUTES_PER_HOUR: i32 = 60;

/// Parse `HH:MM` or `HH:MM:SS` into a minute-resolution time of day.
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime> {
    let s = input.trim();
    let parsed = NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| CoreError::Format {
            input: input.to_string(),
        })?;
    Ok(parsed.with_second(0).unwrap_or(parsed))
}

/// Minutes since midnight for an `HH:MM[:SS]` string.
pub fn time_to_minutes(input: &str) -> Result<i32> {
    parse_time_of_day(input).map(minutes_of)
}

/// Minutes since midnight, seconds dropped.
pub fn minutes_of(t: NaiveTime) -> i32 {
    (t.hour() * 60 + t.minute()) as i32
}

/// Zero-padded `HH:MM`. Offsets past midnight keep counting hours (`25:00`).
pub fn minutes_to_time(minutes: i32) -> String {
    format!(
        "{:02}:{:02}",
        minutes.div_euclid(MINUTES_PER_HOUR),
        minutes.rem_euclid(MINUTES_PER_HOUR)
    )
}

/// Inverse of [`minutes_of`] for offsets inside a single day.
pub fn time_from_minutes(minutes: i32) -> Option<NaiveTime> {
    if !(0..24 * MINUTES_PER_HOUR).contains(&minutes) {
        return None;
    }
    NaiveTime::from_hms_opt(
        minutes.div_euclid(MINUTES_PER_HOUR) as u32,
        minutes.rem_euclid(MINUTES_PER_HOUR) as u32,
        0,
    )
}

pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Overlap test on closed-open intervals `[a_start, a_end)` and `[b_start, b_end)`.
///
/// Three clauses: A starts inside B, A ends inside B, or A contains B.
/// Back-to-back intervals (`a_end == b_start`) do not overlap.
pub fn intervals_overlap(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> bool {
    (a_start >= b_start && a_start < b_end)
        || (a_end > b_start && a_end <= b_end)
        || (a_start <= b_start && a_end >= b_end)
}

/// Monday..=Sunday week containing `date`.
pub fn week_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = u64::from(date.weekday().num_days_from_monday());
    let start = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
    (start, end)
}

/// First..=last calendar day of the month containing `date`.
pub fn month_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let mut last = first;
    while let Some(next) = last.succ_opt() {
        if next.month() != first.month() {
            break;
        }
        last = next;
    }
    (first, last)
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Monday-Friday dates of the month containing `month`, in order.
pub fn work_days_of_month(month: NaiveDate) -> Vec<NaiveDate> {
    let (first, last) = month_range(month);
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| is_weekday(*d))
        .collect()
}

/// Work days of the month grouped into weeks; a new week opens on each Monday.
///
/// The first and last groups may be partial.
pub fn weeks_of_month(month: NaiveDate) -> Vec<Vec<NaiveDate>> {
    let mut weeks: Vec<Vec<NaiveDate>> = Vec::new();
    let mut current: Vec<NaiveDate> = Vec::new();

    for day in work_days_of_month(month) {
        if day.weekday() == Weekday::Mon && !current.is_empty() {
            weeks.push(std::mem::take(&mut current));
        }
        current.push(day);
    }
    if !current.is_empty() {
        weeks.push(current);
    }
    weeks
}

/// Serde adapter: `NaiveTime` as `HH:MM` (accepts `HH:MM:SS` on input).
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(&t.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<NaiveTime>` as `HH:MM` or null.
pub mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        t: &Option<NaiveTime>,
        s: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.collect_str(&t.format("%H:%M")),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| super::parse_time_of_day(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
