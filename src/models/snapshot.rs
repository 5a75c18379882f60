//! Entity snapshot consumed by one generation run.

use serde::{Deserialize, Serialize};

use super::{ClassGroup, Classroom, Institution, Subject, Teacher};

/// A consistent, read-only view of every entity a run needs.
///
/// The surrounding application reads this from its store once per run.
/// The engine only borrows it, so nothing can mutate it mid-run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Institution settings (defines the slot grid).
    pub institution: Institution,
    /// All class groups.
    pub class_groups: Vec<ClassGroup>,
    /// All subjects.
    pub subjects: Vec<Subject>,
    /// All classrooms.
    pub classrooms: Vec<Classroom>,
    /// All teachers.
    pub teachers: Vec<Teacher>,
}

impl Snapshot {
    /// Creates an empty snapshot for an institution.
    pub fn new(institution: Institution) -> Self {
        Self {
            institution,
            ..Default::default()
        }
    }

    /// Adds a class group.
    pub fn with_group(mut self, group: ClassGroup) -> Self {
        self.class_groups.push(group);
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Adds a classroom.
    pub fn with_classroom(mut self, classroom: Classroom) -> Self {
        self.classrooms.push(classroom);
        self
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Finds a group by ID.
    pub fn group(&self, id: &str) -> Option<&ClassGroup> {
        self.class_groups.iter().find(|g| g.id == id)
    }

    /// Finds a subject by ID.
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Finds a classroom by ID.
    pub fn classroom(&self, id: &str) -> Option<&Classroom> {
        self.classrooms.iter().find(|c| c.id == id)
    }

    /// Finds a teacher by ID.
    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    /// The teacher owning a teacher lab, if any.
    pub fn lab_owner(&self, classroom_id: &str) -> Option<&Teacher> {
        self.teachers
            .iter()
            .find(|t| t.home_classroom.as_deref() == Some(classroom_id))
    }
}
