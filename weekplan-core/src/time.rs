//! Clock-time parsing for `hh:mm AM/PM` strings and `"<start> - <end>"` ranges.
//!
//! Generated plans and user edits describe time as 12-hour text. Everything that needs a
//! real time (export, bucketing) goes through this module; strings that fail here are
//! treated as unparseable by callers, never as fatal.

use chrono::{NaiveDate, NaiveTime, Timelike};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Literal separator between the two halves of a time range.
pub const RANGE_SEPARATOR: &str = " - ";

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2}):(\d{2})\s*(AM|PM)\s*$").expect("clock time pattern is valid")
});

/// Why a time string was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    /// Range did not split into exactly two parts on `" - "`
    #[error("malformed time range: {0:?}")]
    MalformedRange(String),

    /// Token is not a valid `hh:mm AM/PM` time
    #[error("malformed time: {0:?}")]
    MalformedTime(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meridian {
    Am,
    Pm,
}

impl Meridian {
    pub fn as_str(&self) -> &'static str {
        match self {
            Meridian::Am => "AM",
            Meridian::Pm => "PM",
        }
    }
}

/// Coarse time-of-day grouping used by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayBucket {
    Morning,
    Afternoon,
    Evening,
}

impl DayBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayBucket::Morning => "morning",
            DayBucket::Afternoon => "afternoon",
            DayBucket::Evening => "evening",
        }
    }
}

/// A 12-hour wall-clock time as written by a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockTime {
    /// Hour as written, 1-12
    hour12: u8,
    minute: u8,
    meridian: Meridian,
}

impl ClockTime {
    pub fn new(hour12: u8, minute: u8, meridian: Meridian) -> Option<Self> {
        if !(1..=12).contains(&hour12) || minute > 59 {
            return None;
        }
        Some(Self {
            hour12,
            minute,
            meridian,
        })
    }

    /// Build from a 24-hour time (seconds are dropped).
    pub fn from_naive_time(time: NaiveTime) -> Self {
        let (is_pm, hour12) = time.hour12();
        Self {
            hour12: hour12 as u8,
            minute: time.minute() as u8,
            meridian: if is_pm { Meridian::Pm } else { Meridian::Am },
        }
    }

    /// Hour exactly as written (1-12)
    pub fn hour12(&self) -> u8 {
        self.hour12
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn meridian(&self) -> Meridian {
        self.meridian
    }

    /// 24-hour hour of day: 12 AM is 0, 12 PM stays 12, other PM hours add 12.
    pub fn hour24(&self) -> u8 {
        match (self.meridian, self.hour12) {
            (Meridian::Am, 12) => 0,
            (Meridian::Am, h) => h,
            (Meridian::Pm, 12) => 12,
            (Meridian::Pm, h) => h + 12,
        }
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour24() as u32, self.minute as u32, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// `YYYY-MM-DDTHH:MM:SS` on `date`, without any offset.
    pub fn to_iso_datetime(&self, date: NaiveDate) -> String {
        format!(
            "{}T{:02}:{:02}:00",
            date.format("%Y-%m-%d"),
            self.hour24(),
            self.minute
        )
    }

    /// Dashboard bucket for this time.
    ///
    /// Any AM time is morning, and so is every PM time whose written hour is 12. That
    /// puts 12:00-12:59 PM in the morning bucket, which existing plans rely on. Remaining
    /// PM times are afternoon when the written (12-hour) hour is below 5, else evening.
    pub fn bucket(&self) -> DayBucket {
        match (self.meridian, self.hour12) {
            (Meridian::Am, _) | (Meridian::Pm, 12) => DayBucket::Morning,
            (Meridian::Pm, h) if h < 5 => DayBucket::Afternoon,
            (Meridian::Pm, _) => DayBucket::Evening,
        }
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02} {}",
            self.hour12,
            self.minute,
            self.meridian.as_str()
        )
    }
}

impl std::str::FromStr for ClockTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_clock_time(s)
    }
}

/// Start and end of a task's time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.start, RANGE_SEPARATOR, self.end)
    }
}

/// Parse a single `hh:mm AM/PM` token (case-insensitive, optional space before the meridian).
pub fn parse_clock_time(token: &str) -> Result<ClockTime, TimeParseError> {
    let malformed = || TimeParseError::MalformedTime(token.to_string());
    let caps = CLOCK_TIME.captures(token).ok_or_else(malformed)?;

    let hour: u8 = caps[1].parse().map_err(|_| malformed())?;
    let minute: u8 = caps[2].parse().map_err(|_| malformed())?;
    let meridian = if caps[3].eq_ignore_ascii_case("AM") {
        Meridian::Am
    } else {
        Meridian::Pm
    };

    ClockTime::new(hour, minute, meridian).ok_or_else(malformed)
}

/// Split `range` on `" - "` and parse both halves.
pub fn parse_range(range: &str) -> Result<TimeRange, TimeParseError> {
    let parts: Vec<&str> = range.split(RANGE_SEPARATOR).collect();
    let [start, end] = parts.as_slice() else {
        return Err(TimeParseError::MalformedRange(range.to_string()));
    };

    Ok(TimeRange {
        start: parse_clock_time(start)?,
        end: parse_clock_time(end)?,
    })
}

/// Parse `token` and render it as an ISO datetime on `date`.
pub fn to_iso_datetime(token: &str, date: NaiveDate) -> Result<String, TimeParseError> {
    Ok(parse_clock_time(token)?.to_iso_datetime(date))
}
