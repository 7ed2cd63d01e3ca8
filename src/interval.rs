// ⏱️ Time Interval - elapsed hours between two wall-clock times
//
// Shift and equipment records carry bare "HH:MM" strings with no date.
// An end time earlier than the start time means the interval crossed
// midnight once:
//
//   22:00 → 06:00  =  8h   (wraps by adding 24h)
//   08:30 → 08:30  =  0h   (same instant is zero-length, not a full day)

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

// ============================================================================
// CLOCK TIME
// ============================================================================

/// A parsed 24-hour wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> CoreResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(CoreError::invalid_format(&format!("{}:{:02}", hour, minute)));
        }
        Ok(ClockTime { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    /// Minutes from `self` forward to `end`, wrapping past midnight at most once
    pub fn minutes_until(&self, end: ClockTime) -> u32 {
        let start = self.minutes_since_midnight() as i64;
        let finish = end.minutes_since_midnight() as i64;

        let mut total = finish - start;
        if total < 0 {
            total += MINUTES_PER_DAY as i64;
        }

        total as u32
    }
}

impl FromStr for ClockTime {
    type Err = CoreError;

    /// Accepts exactly `\d{1,2}:\d{2}`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour_part, minute_part) = s
            .split_once(':')
            .ok_or_else(|| CoreError::invalid_format(s))?;

        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

        if !digits(hour_part) || hour_part.len() > 2 {
            return Err(CoreError::invalid_format(s));
        }
        if !digits(minute_part) || minute_part.len() != 2 {
            return Err(CoreError::invalid_format(s));
        }

        let hour: u8 = hour_part.parse().map_err(|_| CoreError::invalid_format(s))?;
        let minute: u8 = minute_part.parse().map_err(|_| CoreError::invalid_format(s))?;

        ClockTime::new(hour, minute).map_err(|_| CoreError::invalid_format(s))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Elapsed hours from `start` to `end`, unrounded
///
/// Example:
/// ```
/// use port_ops::hours_between;
///
/// assert_eq!(hours_between("07:00", "13:00").unwrap(), 6.0);
/// assert_eq!(hours_between("23:00", "01:00").unwrap(), 2.0);
/// assert_eq!(hours_between("08:30", "08:30").unwrap(), 0.0);
/// ```
pub fn hours_between(start: &str, end: &str) -> CoreResult<f64> {
    let start: ClockTime = start.parse()?;
    let end: ClockTime = end.parse()?;

    Ok(start.minutes_until(end) as f64 / 60.0)
}

// ============================================================================
// TIME RECORD
// ============================================================================

/// A single shift or equipment-usage interval as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRecord {
    pub start_time: String,
    pub end_time: String,
}

impl TimeRecord {
    pub fn new(start_time: &str, end_time: &str) -> Self {
        TimeRecord {
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }

    pub fn hours(&self) -> CoreResult<f64> {
        hours_between(&self.start_time, &self.end_time)
    }

    pub fn crosses_midnight(&self) -> CoreResult<bool> {
        let start: ClockTime = self.start_time.parse()?;
        let end: ClockTime = self.end_time.parse()?;
        Ok(end < start)
    }

    /// Both ends parse; used before a record is written to the store
    pub fn validate(&self) -> CoreResult<()> {
        self.start_time.parse::<ClockTime>()?;
        self.end_time.parse::<ClockTime>()?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
