//! Time dimension derived from event timestamps.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

/// One row of the `time` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRow {
    pub start_time: NaiveDateTime,
    pub hour: i32,
    pub day: i32,
    /// ISO 8601 week number.
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// Monday through Friday.
    pub weekday: bool,
}

/// Convert milliseconds since the Unix epoch to a UTC timestamp.
pub fn timestamp_from_millis(ts: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ts).map(|dt| dt.naive_utc())
}

impl TimeRow {
    pub fn from_timestamp(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            hour: start_time.hour() as i32,
            day: start_time.day() as i32,
            week: start_time.iso_week().week() as i32,
            month: start_time.month() as i32,
            year: start_time.year(),
            weekday: start_time.weekday().num_days_from_monday() < 5,
        }
    }

    pub fn from_millis(ts: i64) -> Option<Self> {
        timestamp_from_millis(ts).map(Self::from_timestamp)
    }
}
