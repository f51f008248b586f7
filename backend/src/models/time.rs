//! Wall-clock primitives for weekly timetables.
//!
//! Courses repeat every week, so the model only needs a weekday and a
//! minute-precision time of day. Neither type carries a date or a timezone.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Errors raised while parsing or constructing clock values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("invalid time '{0}': expected HH:MM or HH:MM:SS")]
    InvalidFormat(String),

    #[error("time out of range: {hour:02}:{minute:02}")]
    OutOfRange { hour: u32, minute: u32 },

    #[error("day of week must be between 0 (Monday) and 6 (Sunday), got {0}")]
    InvalidDay(i64),

    #[error("unknown day name '{0}'")]
    UnknownDayName(String),
}

/// Time of day with minute precision, stored as minutes since midnight.
///
/// Serializes as a zero-padded `"HH:MM"` string.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Build a clock time from hour (0-23) and minute (0-59).
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimeError> {
        if hour > 23 || minute > 59 {
            return Err(TimeError::OutOfRange { hour, minute });
        }
        Ok(Self((hour * 60 + minute) as u16))
    }

    /// Build a clock time from minutes since midnight.
    pub fn from_minutes(minutes: u16) -> Result<Self, TimeError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(TimeError::OutOfRange {
                hour: u32::from(minutes / 60),
                minute: u32::from(minutes % 60),
            });
        }
        Ok(Self(minutes))
    }

    /// Parse `HH:MM` or `HH:MM:SS`. Seconds are accepted and truncated.
    pub fn parse(input: &str) -> Result<Self, TimeError> {
        let trimmed = input.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(TimeError::InvalidFormat(input.to_string()));
        }

        let field = |s: &str| -> Result<u32, TimeError> {
            if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TimeError::InvalidFormat(input.to_string()));
            }
            s.parse::<u32>()
                .map_err(|_| TimeError::InvalidFormat(input.to_string()))
        };

        let hour = field(parts[0])?;
        let minute = field(parts[1])?;
        if let Some(seconds) = parts.get(2) {
            if field(seconds)? > 59 {
                return Err(TimeError::InvalidFormat(input.to_string()));
            }
        }
        Self::new(hour, minute)
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.0 % 60)
    }

    /// Convert to a chrono time for date arithmetic.
    pub fn to_naive_time(&self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_num_seconds_from_midnight_opt(u32::from(self.0) * 60, 0)
            .unwrap_or_default()
    }

    /// Truncate a chrono time to minute precision.
    pub fn from_naive_time(time: chrono::NaiveTime) -> Self {
        use chrono::Timelike;
        Self((time.hour() * 60 + time.minute()) as u16)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ClockTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Day of the week, Monday = 0 through Sunday = 6.
///
/// Serializes as the bare integer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct DayOfWeek(u8);

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

// Accepted on import alongside the English names.
const GERMAN_DAY_NAMES: [&str; 7] = [
    "montag",
    "dienstag",
    "mittwoch",
    "donnerstag",
    "freitag",
    "samstag",
    "sonntag",
];

impl DayOfWeek {
    pub const MONDAY: DayOfWeek = DayOfWeek(0);
    pub const TUESDAY: DayOfWeek = DayOfWeek(1);
    pub const WEDNESDAY: DayOfWeek = DayOfWeek(2);
    pub const THURSDAY: DayOfWeek = DayOfWeek(3);
    pub const FRIDAY: DayOfWeek = DayOfWeek(4);
    pub const SATURDAY: DayOfWeek = DayOfWeek(5);
    pub const SUNDAY: DayOfWeek = DayOfWeek(6);

    pub fn new(index: i64) -> Result<Self, TimeError> {
        if (0..=6).contains(&index) {
            Ok(Self(index as u8))
        } else {
            Err(TimeError::InvalidDay(index))
        }
    }

    /// All seven days, Monday first.
    pub fn all() -> impl Iterator<Item = DayOfWeek> {
        (0u8..7).map(DayOfWeek)
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    /// English name, e.g. `"Monday"`.
    pub fn name(&self) -> &'static str {
        DAY_NAMES[usize::from(self.0)]
    }

    /// Parse an English or German day name (case-insensitive) or a digit 0-6.
    pub fn from_name(input: &str) -> Result<Self, TimeError> {
        let needle = input.trim().to_lowercase();
        if let Ok(index) = needle.parse::<i64>() {
            return Self::new(index);
        }
        DAY_NAMES
            .iter()
            .position(|name| name.to_lowercase() == needle)
            .or_else(|| GERMAN_DAY_NAMES.iter().position(|name| *name == needle))
            .map(|index| Self(index as u8))
            .ok_or_else(|| TimeError::UnknownDayName(input.to_string()))
    }

    pub fn to_chrono(&self) -> chrono::Weekday {
        match self.0 {
            0 => chrono::Weekday::Mon,
            1 => chrono::Weekday::Tue,
            2 => chrono::Weekday::Wed,
            3 => chrono::Weekday::Thu,
            4 => chrono::Weekday::Fri,
            5 => chrono::Weekday::Sat,
            _ => chrono::Weekday::Sun,
        }
    }

    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        Self(weekday.num_days_from_monday() as u8)
    }
}

impl TryFrom<i64> for DayOfWeek {
    type Error = TimeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> Self {
        day.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod time_tests;
