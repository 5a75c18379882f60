//! Schedule output model.
//!
//! A generated timetable is a list of [`ScheduleSlot`]s. Audits of a
//! timetable produce [`ConstraintViolation`]s.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ClockTime;

/// One committed teaching session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleSlot {
    /// Working day name.
    pub day: String,
    /// 1-based lesson number within the day.
    pub lesson_number: u32,
    /// Attending group.
    pub class_group_id: String,
    /// Taught subject.
    pub subject_id: String,
    /// Teaching teacher.
    pub teacher_id: String,
    /// Room.
    pub classroom_id: String,
    /// Lesson start.
    pub start_time: ClockTime,
    /// Lesson end.
    pub end_time: ClockTime,
}

impl ScheduleSlot {
    /// Whether two sessions share the same (day, lesson) slot.
    pub fn same_time_as(&self, other: &ScheduleSlot) -> bool {
        self.day == other.day && self.lesson_number == other.lesson_number
    }
}

/// A hard-constraint violation found in a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// Kind of violation.
    pub kind: ViolationKind,
    /// Entity the violation is about (teacher, room, group or slot ID).
    pub entity_id: String,
    /// Positions of the offending entries in the audited slot list.
    pub slot_positions: Vec<usize>,
    /// Human-readable description.
    pub message: String,
}

/// Classification of timetable violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A teacher teaches two sessions at once.
    TeacherClash,
    /// A classroom hosts two sessions at once.
    ClassroomClash,
    /// A group attends two sessions at once.
    GroupClash,
    /// A teacher is scheduled outside their availability.
    TeacherUnavailable,
    /// The room type, specialization, capacity or ownership does not fit.
    RoomMismatch,
    /// The teacher may not teach this subject to this group.
    TeacherNotQualified,
    /// A demand has more or fewer sessions than its weekly count.
    SessionCountMismatch,
    /// A slot references an entity missing from the snapshot.
    UnknownReference,
    /// A slot's (day, lesson) lies outside the institution's grid.
    OutsideGrid,
    /// The snapshot itself is inconsistent.
    InvalidSnapshot,
}

impl ConstraintViolation {
    /// Creates a violation.
    pub fn new(
        kind: ViolationKind,
        entity_id: impl Into<String>,
        slot_positions: Vec<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            slot_positions,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}
