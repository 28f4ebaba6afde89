//! Inclusive UTC day windows
//!
//! A window always spans whole calendar days: it opens at 00:00:00.000 UTC of
//! its first day and closes at 23:59:59.999 UTC of its last day.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive range of UTC calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl DateWindow {
    /// A window covering exactly one day
    pub fn day(date: NaiveDate) -> Self {
        Self {
            first_day: date,
            last_day: date,
        }
    }

    /// A window covering `first_day..=last_day`
    pub fn days(first_day: NaiveDate, last_day: NaiveDate) -> Result<Self, WindowError> {
        if last_day < first_day {
            return Err(WindowError::EndBeforeStart {
                start: first_day,
                end: last_day,
            });
        }
        Ok(Self {
            first_day,
            last_day,
        })
    }

    /// Window from optional bounds
    ///
    /// No bounds means no window at all; a start alone means that single day.
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<Self>, WindowError> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), None) => Ok(Some(Self::day(start))),
            (Some(start), Some(end)) => Self::days(start, end).map(Some),
            (None, Some(_)) => Err(WindowError::EndWithoutStart),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// 00:00:00.000 UTC of the first day
    pub fn start(&self) -> DateTime<Utc> {
        start_of_day(self.first_day)
    }

    /// 23:59:59.999 UTC of the last day
    pub fn end(&self) -> DateTime<Utc> {
        end_of_day(self.last_day)
    }

    /// Whether an instant falls inside the window
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at <= self.end()
    }

    /// Number of calendar days covered, counting both ends
    pub fn total_days(&self) -> i64 {
        (self.last_day - self.first_day).num_days() + 1
    }

    /// Days from the first day through `today`, counting both ends
    ///
    /// Zero or negative before the window opens; may exceed
    /// [`total_days`](Self::total_days) once it has closed.
    pub fn days_through(&self, today: NaiveDate) -> i64 {
        (today - self.first_day).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first_day == self.last_day {
            write!(f, "{}", self.first_day)
        } else {
            write!(f, "{} to {}", self.first_day, self.last_day)
        }
    }
}

/// 00:00:00.000 UTC of `date`
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// 23:59:59.999 UTC of `date`
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// Parse a calendar day
///
/// Accepts `dd-mm-yyyy`, `dd/mm/yyyy` and ISO `yyyy-mm-dd`.
pub fn parse_day(s: &str) -> Result<NaiveDate, WindowError> {
    let s = s.trim();
    for format in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date);
        }
    }
    Err(WindowError::InvalidDate(s.to_string()))
}

/// Parse an instant
///
/// Accepts RFC 3339 timestamps, or a calendar day meaning its UTC midnight.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, WindowError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s.trim()) {
        return Ok(at.with_timezone(&Utc));
    }
    parse_day(s).map(start_of_day)
}

/// Errors building a window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    EndWithoutStart,
    InvalidDate(String),
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndBeforeStart { start, end } => {
                write!(f, "Window end {} is before its start {}", end, start)
            }
            Self::EndWithoutStart => write!(f, "A window end needs a start date"),
            Self::InvalidDate(s) => {
                write!(f, "Invalid date '{}' (expected dd-mm-yyyy or yyyy-mm-dd)", s)
            }
        }
    }
}

impl std::error::Error for WindowError {}
