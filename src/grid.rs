//! Weekly slot grid.
//!
//! The grid is the fixed universe of schedulable time: every working day
//! crossed with lesson numbers `1..=lessons_per_day`, each slot carrying
//! its clock start and end.
//!
//! # Time Model
//! Lesson 1 starts at `start_time`. Lesson `n + 1` starts after lesson `n`
//! ends plus `break_durations_min[n - 1]` (0 if the entry is missing).
//!
//! # Indexing
//! Slots are stored day-major: `index = day_index * lessons_per_day +
//! (lesson_number - 1)`. Every busy table in the engine is keyed by this
//! index.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{ClockTime, Institution};

/// One (day, lesson) unit of schedulable time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Position in the grid.
    pub index: usize,
    /// Position of the day in the working week.
    pub day_index: usize,
    /// 1-based lesson number.
    pub lesson_number: u32,
    /// Lesson start.
    pub start: ClockTime,
    /// Lesson end.
    pub end: ClockTime,
}

/// Reasons an institution cannot produce a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("institution has no working days")]
    NoWorkingDays,
    #[error("institution has zero lessons per day")]
    NoLessons,
    #[error("working day '{0}' is listed more than once")]
    DuplicateDay(String),
    #[error("lesson duration must be positive")]
    ZeroLessonDuration,
    #[error("lesson {lesson} ends at or after midnight")]
    PastMidnight { lesson: u32 },
}

/// The ordered set of weekly slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotGrid {
    days: Vec<String>,
    lessons_per_day: u32,
    slots: Vec<Slot>,
}

impl SlotGrid {
    /// Builds the grid for an institution.
    pub fn new(institution: &Institution) -> Result<Self, GridError> {
        if institution.working_days.is_empty() {
            return Err(GridError::NoWorkingDays);
        }
        if institution.lessons_per_day == 0 {
            return Err(GridError::NoLessons);
        }
        if institution.lesson_duration_min == 0 {
            return Err(GridError::ZeroLessonDuration);
        }
        let mut seen = HashSet::new();
        for day in &institution.working_days {
            if !seen.insert(day.as_str()) {
                return Err(GridError::DuplicateDay(day.clone()));
            }
        }

        let times = lesson_times(institution)?;
        let lpd = institution.lessons_per_day as usize;
        let mut slots = Vec::with_capacity(institution.working_days.len() * lpd);
        for day_index in 0..institution.working_days.len() {
            for (i, &(start, end)) in times.iter().enumerate() {
                slots.push(Slot {
                    index: day_index * lpd + i,
                    day_index,
                    lesson_number: i as u32 + 1,
                    start,
                    end,
                });
            }
        }

        Ok(Self {
            days: institution.working_days.clone(),
            lessons_per_day: institution.lessons_per_day,
            slots,
        })
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the grid has no slots (never true for a built grid).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots, day-major.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot by index.
    #[inline]
    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    /// Number of working days.
    #[inline]
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Lessons per day.
    #[inline]
    pub fn lessons_per_day(&self) -> u32 {
        self.lessons_per_day
    }

    /// Working day names in week order.
    pub fn days(&self) -> &[String] {
        &self.days
    }

    /// Name of a working day.
    pub fn day_name(&self, day_index: usize) -> &str {
        &self.days[day_index]
    }

    /// Day position of a slot index.
    #[inline]
    pub fn day_of(&self, index: usize) -> usize {
        index / self.lessons_per_day as usize
    }

    /// Slot index of a (day position, lesson number) pair.
    pub fn index_of(&self, day_index: usize, lesson_number: u32) -> Option<usize> {
        if day_index >= self.days.len() || lesson_number == 0 || lesson_number > self.lessons_per_day
        {
            return None;
        }
        Some(day_index * self.lessons_per_day as usize + (lesson_number - 1) as usize)
    }

    /// Slot index of a (day name, lesson number) pair.
    pub fn locate(&self, day: &str, lesson_number: u32) -> Option<usize> {
        let day_index = self.days.iter().position(|d| d == day)?;
        self.index_of(day_index, lesson_number)
    }

    /// Slots of one day.
    pub fn slots_on_day(&self, day_index: usize) -> &[Slot] {
        let lpd = self.lessons_per_day as usize;
        &self.slots[day_index * lpd..(day_index + 1) * lpd]
    }
}

/// Start and end of each lesson of a day.
fn lesson_times(institution: &Institution) -> Result<Vec<(ClockTime, ClockTime)>, GridError> {
    let mut times = Vec::new();
    let mut current = institution.start_time;
    for lesson in 1..=institution.lessons_per_day {
        let end = current.plus_minutes(institution.lesson_duration_min);
        if !end.is_within_day() {
            return Err(GridError::PastMidnight { lesson });
        }
        times.push((current, end));
        let gap = institution
            .break_durations_min
            .get(lesson as usize - 1)
            .copied()
            .unwrap_or(0);
        current = end.plus_minutes(gap);
    }
    Ok(times)
}
