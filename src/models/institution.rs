//! Institution model.
//!
//! The institution fixes the weekly time frame: which days are taught,
//! how many lessons fit in a day, how long lessons and breaks last, and
//! when the first lesson starts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::demand::RoundingPolicy;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Wall-clock time of day with minute resolution.
///
/// Serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    minutes: u32,
}

/// Error returned when a `"HH:MM"` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid clock time '{0}', expected HH:MM")]
pub struct ParseClockTimeError(String);

impl ClockTime {
    /// Creates a clock time. Returns `None` for out-of-range components.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self {
                minutes: hour * 60 + minute,
            })
        } else {
            None
        }
    }

    /// Creates a clock time from minutes since midnight.
    ///
    /// Values past midnight are kept as-is; callers check
    /// [`ClockTime::is_within_day`] where that matters.
    pub fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    /// Minutes since midnight.
    #[inline]
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Hour component.
    #[inline]
    pub fn hour(&self) -> u32 {
        self.minutes / 60
    }

    /// Minute component.
    #[inline]
    pub fn minute(&self) -> u32 {
        self.minutes % 60
    }

    /// Returns this time shifted forward, saturating at `u32::MAX` minutes.
    pub fn plus_minutes(self, minutes: u32) -> Self {
        Self {
            minutes: self.minutes.saturating_add(minutes),
        }
    }

    /// Whether the time is before midnight.
    pub fn is_within_day(&self) -> bool {
        self.minutes < MINUTES_PER_DAY
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ParseClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseClockTimeError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let hour: u32 = h.parse().map_err(|_| err())?;
        let minute: u32 = m.parse().map_err(|_| err())?;
        ClockTime::new(hour, minute).ok_or_else(err)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ParseClockTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// Institution-wide timetable settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    /// Display name.
    pub name: String,
    /// Taught days, in week order.
    pub working_days: Vec<String>,
    /// Lesson slots per day (lesson numbers are 1-based).
    pub lessons_per_day: u32,
    /// Length of one lesson in minutes.
    pub lesson_duration_min: u32,
    /// Break after lesson `i + 1`, in minutes. Missing entries mean no break.
    pub break_durations_min: Vec<u32>,
    /// Start of the first lesson.
    pub start_time: ClockTime,
    /// Teaching weeks per academic year, used to turn annual hours into
    /// weekly sessions.
    pub academic_weeks: u32,
    /// How annual hours round to weekly sessions. Generation and audit
    /// both read it from here.
    #[serde(default)]
    pub hours_rounding: RoundingPolicy,
}

impl Default for Institution {
    fn default() -> Self {
        Self {
            name: String::new(),
            working_days: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            lessons_per_day: 4,
            lesson_duration_min: 70,
            break_durations_min: vec![10, 20, 10],
            start_time: ClockTime::from_minutes(9 * 60),
            academic_weeks: 40,
            hours_rounding: RoundingPolicy::Nearest,
        }
    }
}

impl Institution {
    /// Creates an institution with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the working days.
    pub fn with_working_days<I, S>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.working_days = days.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the number of lessons per day.
    pub fn with_lessons_per_day(mut self, lessons: u32) -> Self {
        self.lessons_per_day = lessons;
        self
    }

    /// Sets the lesson duration in minutes.
    pub fn with_lesson_duration(mut self, minutes: u32) -> Self {
        self.lesson_duration_min = minutes;
        self
    }

    /// Sets the breaks between lessons.
    pub fn with_breaks(mut self, breaks: Vec<u32>) -> Self {
        self.break_durations_min = breaks;
        self
    }

    /// Sets the first lesson's start time.
    pub fn with_start_time(mut self, start: ClockTime) -> Self {
        self.start_time = start;
        self
    }

    /// Sets the number of academic weeks.
    pub fn with_academic_weeks(mut self, weeks: u32) -> Self {
        self.academic_weeks = weeks;
        self
    }

    /// Sets the annual hours rounding.
    pub fn with_hours_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.hours_rounding = rounding;
        self
    }

    /// Position of a day in the working week.
    pub fn day_index(&self, day: &str) -> Option<usize> {
        self.working_days.iter().position(|d| d == day)
    }

    /// Number of lesson slots in one week.
    pub fn weekly_slot_count(&self) -> usize {
        self.working_days.len() * self.lessons_per_day as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_time_parse_and_display() {
        let t: ClockTime = "09:05".parse().unwrap();
        assert_eq!(t.hour(), 9);
        assert_eq!(t.minute(), 5);
        assert_eq!(t.to_string(), "09:05");
        assert_eq!(t.plus_minutes(70).to_string(), "10:15");
    }

    #[test]
    fn test_plus_minutes_saturates() {
        let late = ClockTime::new(23, 0).unwrap().plus_minutes(u32::MAX);
        assert_eq!(late.minutes(), u32::MAX);
        assert!(!late.is_within_day());
    }

    #[test]
    fn test_clock_time_rejects_garbage() {
        assert!("9".parse::<ClockTime>().is_err());
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("10:60".parse::<ClockTime>().is_err());
        assert!("ab:cd".parse::<ClockTime>().is_err());
    }

    #[test]
    fn test_clock_time_serde_as_string() {
        let t = ClockTime::new(13, 30).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"13:30\"");
        let back: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }

    #[test]
    fn test_institution_defaults() {
        let inst = Institution::new("College");
        assert_eq!(inst.working_days.len(), 5);
        assert_eq!(inst.lessons_per_day, 4);
        assert_eq!(inst.academic_weeks, 40);
        assert_eq!(inst.hours_rounding, RoundingPolicy::Nearest);
        assert_eq!(inst.start_time.to_string(), "09:00");
        assert_eq!(inst.weekly_slot_count(), 20);
        assert_eq!(inst.day_index("Wednesday"), Some(2));
        assert_eq!(inst.day_index("Sunday"), None);
    }
}
