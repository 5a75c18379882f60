//! Subject model.

use serde::{Deserialize, Serialize};

/// Kind of teaching a subject needs, which decides its room type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// Lecture-style teaching in a theory room or teacher lab.
    Theory,
    /// Practical teaching in a laboratory.
    Lab,
}

impl SubjectType {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Theory => "theory",
            SubjectType::Lab => "lab",
        }
    }
}

/// A taught subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Display name. Teachers list the subjects they teach by name.
    pub name: String,
    /// Theory or lab.
    pub subject_type: SubjectType,
    /// Course (study year) the subject belongs to.
    pub course: u32,
    /// Teachers eligible to teach this subject.
    pub teacher_ids: Vec<String>,
}

impl Subject {
    /// Creates a subject.
    pub fn new(id: impl Into<String>, name: impl Into<String>, subject_type: SubjectType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subject_type,
            course: 1,
            teacher_ids: Vec::new(),
        }
    }

    /// Creates a theory subject.
    pub fn theory(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, SubjectType::Theory)
    }

    /// Creates a lab subject.
    pub fn lab(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, SubjectType::Lab)
    }

    /// Sets the course.
    pub fn with_course(mut self, course: u32) -> Self {
        self.course = course;
        self
    }

    /// Adds an eligible teacher.
    pub fn with_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.teacher_ids.push(teacher_id.into());
        self
    }

    /// Whether this is a lab subject.
    pub fn is_lab(&self) -> bool {
        self.subject_type == SubjectType::Lab
    }
}
