//! Classroom model.
//!
//! Rooms come in three kinds. Theory rooms host lectures, labs host
//! practical sessions (optionally restricted to a set of subjects), and
//! teacher labs are lecture rooms that belong to one teacher.

use serde::{Deserialize, Serialize};

use super::SubjectType;

/// Room classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassroomType {
    /// General lecture room.
    Theory,
    /// Laboratory.
    Lab,
    /// Lecture room owned by a teacher (see `Teacher::home_classroom`).
    TeacherLab,
}

impl ClassroomType {
    /// Whether sessions of the given subject type may use this room type.
    pub fn serves(&self, subject_type: SubjectType) -> bool {
        match subject_type {
            SubjectType::Lab => *self == ClassroomType::Lab,
            SubjectType::Theory => {
                matches!(self, ClassroomType::Theory | ClassroomType::TeacherLab)
            }
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassroomType::Theory => "theory",
            ClassroomType::Lab => "lab",
            ClassroomType::TeacherLab => "teacher_lab",
        }
    }
}

/// A physical room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classroom {
    /// Unique classroom identifier.
    pub id: String,
    /// Room number as shown on the door.
    pub number: String,
    /// Floor.
    pub floor: i32,
    /// Room kind.
    pub classroom_type: ClassroomType,
    /// Whether the room has computers.
    pub has_computers: bool,
    /// Subject IDs a specialized lab is reserved for. Empty = general room.
    pub specialization: Vec<String>,
    /// Seats.
    pub capacity: u32,
}

impl Classroom {
    /// Creates a room with 30 seats.
    pub fn new(id: impl Into<String>, classroom_type: ClassroomType) -> Self {
        let id = id.into();
        Self {
            number: id.clone(),
            id,
            floor: 1,
            classroom_type,
            has_computers: false,
            specialization: Vec::new(),
            capacity: 30,
        }
    }

    /// Creates a theory room.
    pub fn theory(id: impl Into<String>) -> Self {
        Self::new(id, ClassroomType::Theory)
    }

    /// Creates a lab.
    pub fn lab(id: impl Into<String>) -> Self {
        Self::new(id, ClassroomType::Lab)
    }

    /// Creates a teacher lab.
    pub fn teacher_lab(id: impl Into<String>) -> Self {
        Self::new(id, ClassroomType::TeacherLab)
    }

    /// Sets the room number.
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    /// Sets the floor.
    pub fn with_floor(mut self, floor: i32) -> Self {
        self.floor = floor;
        self
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Marks the room as equipped with computers.
    pub fn with_computers(mut self) -> Self {
        self.has_computers = true;
        self
    }

    /// Reserves the room for a subject.
    pub fn with_specialization(mut self, subject_id: impl Into<String>) -> Self {
        self.specialization.push(subject_id.into());
        self
    }

    /// Whether the room is reserved for specific subjects.
    pub fn is_specialized(&self) -> bool {
        !self.specialization.is_empty()
    }

    /// Whether the room is reserved for the given subject.
    pub fn specializes_in(&self, subject_id: &str) -> bool {
        self.specialization.iter().any(|s| s == subject_id)
    }
}
