//! Class group model.
//!
//! A class group is a cohort of students that attends every session of
//! its subjects together.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cohort of students with its annual subject load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGroup {
    /// Unique group identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Course (study year).
    pub course: u32,
    /// Optional specialization label.
    pub specialization: Option<String>,
    /// Home classroom ID, preferred for theory sessions.
    pub home_classroom: Option<String>,
    /// Number of students.
    pub students_count: u32,
    /// Required annual hours per subject ID.
    pub subject_hours: BTreeMap<String, u32>,
}

impl ClassGroup {
    /// Creates a first-year group of 25 students with no subjects.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            course: 1,
            specialization: None,
            home_classroom: None,
            students_count: 25,
            subject_hours: BTreeMap::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the course.
    pub fn with_course(mut self, course: u32) -> Self {
        self.course = course;
        self
    }

    /// Sets the specialization.
    pub fn with_specialization(mut self, specialization: impl Into<String>) -> Self {
        self.specialization = Some(specialization.into());
        self
    }

    /// Sets the home classroom.
    pub fn with_home_classroom(mut self, classroom_id: impl Into<String>) -> Self {
        self.home_classroom = Some(classroom_id.into());
        self
    }

    /// Sets the student count.
    pub fn with_students(mut self, count: u32) -> Self {
        self.students_count = count;
        self
    }

    /// Adds annual hours for a subject.
    pub fn with_subject_hours(mut self, subject_id: impl Into<String>, hours: u32) -> Self {
        self.subject_hours.insert(subject_id.into(), hours);
        self
    }

    /// Sum of annual hours across subjects.
    pub fn total_annual_hours(&self) -> u64 {
        self.subject_hours.values().map(|&h| u64::from(h)).sum()
    }
}
