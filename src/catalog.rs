//! Indexed, read-only view of a snapshot.
//!
//! The catalog validates a snapshot once, builds its slot grid, and
//! replaces string IDs with dense indices. Every other component refers
//! to groups, subjects, teachers and classrooms by these indices.
//!
//! It also owns the eligibility predicates shared by the solver and the
//! post-hoc audit, so both judge a session by the same rules.

use std::collections::HashMap;

use crate::error::ConfigurationError;
use crate::grid::SlotGrid;
use crate::models::{ClassGroup, Classroom, ClassroomType, Snapshot, Subject, SubjectType, Teacher};
use crate::validation::validate_snapshot;

/// Outcome of checking a classroom against a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomFit {
    /// The room can host the session.
    Suitable,
    /// Room type does not serve the subject type.
    WrongType,
    /// Specialization rules exclude the room for this subject.
    NotSpecialized,
    /// Capacity is below the group size.
    TooSmall,
    /// A teacher lab owned by a different teacher.
    OwnedByOther,
}

impl RoomFit {
    /// Whether the room is usable.
    #[inline]
    pub fn is_suitable(self) -> bool {
        self == RoomFit::Suitable
    }

    /// Short reason text.
    pub fn reason(self) -> &'static str {
        match self {
            RoomFit::Suitable => "suitable",
            RoomFit::WrongType => "room type does not match the subject",
            RoomFit::NotSpecialized => "lab specialization does not cover the subject",
            RoomFit::TooSmall => "capacity is below the group size",
            RoomFit::OwnedByOther => "teacher lab belongs to another teacher",
        }
    }
}

/// Dense index over a validated snapshot.
#[derive(Debug)]
pub struct Catalog<'a> {
    snapshot: &'a Snapshot,
    grid: SlotGrid,
    groups: HashMap<&'a str, usize>,
    subjects: HashMap<&'a str, usize>,
    teachers: HashMap<&'a str, usize>,
    classrooms: HashMap<&'a str, usize>,
    /// Owning teacher per classroom.
    lab_owner: Vec<Option<usize>>,
    /// Per subject: whether any lab specializes in it.
    has_specialized_lab: Vec<bool>,
    /// Teacher x slot availability, row-major.
    available: Vec<bool>,
}

impl<'a> Catalog<'a> {
    /// Validates the snapshot and builds the index.
    ///
    /// # Errors
    /// Returns every integrity issue found by [`validate_snapshot`].
    pub fn new(snapshot: &'a Snapshot) -> Result<Self, ConfigurationError> {
        validate_snapshot(snapshot)?;
        let grid = SlotGrid::new(&snapshot.institution)?;

        let groups = index_by(snapshot.class_groups.iter().map(|g| g.id.as_str()));
        let subjects = index_by(snapshot.subjects.iter().map(|s| s.id.as_str()));
        let teachers = index_by(snapshot.teachers.iter().map(|t| t.id.as_str()));
        let classrooms = index_by(snapshot.classrooms.iter().map(|c| c.id.as_str()));

        let mut lab_owner = vec![None; snapshot.classrooms.len()];
        for (t, teacher) in snapshot.teachers.iter().enumerate() {
            if let Some(room) = teacher.home_classroom.as_deref().and_then(|id| classrooms.get(id)) {
                lab_owner[*room].get_or_insert(t);
            }
        }

        let has_specialized_lab = snapshot
            .subjects
            .iter()
            .map(|s| {
                snapshot
                    .classrooms
                    .iter()
                    .any(|c| c.classroom_type == ClassroomType::Lab && c.specializes_in(&s.id))
            })
            .collect();

        let mut available = vec![false; snapshot.teachers.len() * grid.len()];
        for (t, teacher) in snapshot.teachers.iter().enumerate() {
            for slot in grid.slots() {
                available[t * grid.len() + slot.index] =
                    teacher.is_available(grid.day_name(slot.day_index), slot.lesson_number);
            }
        }

        Ok(Self {
            snapshot,
            grid,
            groups,
            subjects,
            teachers,
            classrooms,
            lab_owner,
            has_specialized_lab,
            available,
        })
    }

    /// The underlying snapshot.
    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    /// The weekly slot grid.
    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn group(&self, g: usize) -> &'a ClassGroup {
        &self.snapshot.class_groups[g]
    }

    pub fn subject(&self, s: usize) -> &'a Subject {
        &self.snapshot.subjects[s]
    }

    pub fn teacher(&self, t: usize) -> &'a Teacher {
        &self.snapshot.teachers[t]
    }

    pub fn classroom(&self, r: usize) -> &'a Classroom {
        &self.snapshot.classrooms[r]
    }

    pub fn group_count(&self) -> usize {
        self.snapshot.class_groups.len()
    }

    pub fn teacher_count(&self) -> usize {
        self.snapshot.teachers.len()
    }

    pub fn classroom_count(&self) -> usize {
        self.snapshot.classrooms.len()
    }

    pub fn group_index(&self, id: &str) -> Option<usize> {
        self.groups.get(id).copied()
    }

    pub fn subject_index(&self, id: &str) -> Option<usize> {
        self.subjects.get(id).copied()
    }

    pub fn teacher_index(&self, id: &str) -> Option<usize> {
        self.teachers.get(id).copied()
    }

    pub fn classroom_index(&self, id: &str) -> Option<usize> {
        self.classrooms.get(id).copied()
    }

    /// Teacher owning a classroom, if any.
    pub fn lab_owner(&self, room: usize) -> Option<usize> {
        self.lab_owner[room]
    }

    /// Whether a teacher is available at a slot.
    #[inline]
    pub fn is_available(&self, teacher: usize, slot: usize) -> bool {
        self.available[teacher * self.grid.len() + slot]
    }

    /// Number of grid slots at which a teacher is available.
    pub fn available_slot_count(&self, teacher: usize) -> usize {
        let n = self.grid.len();
        self.available[teacher * n..(teacher + 1) * n]
            .iter()
            .filter(|&&a| a)
            .count()
    }

    /// Whether a teacher may teach a subject to a group.
    ///
    /// The teacher must be listed by the subject, teach it (by name or ID),
    /// and be assigned to the group.
    pub fn is_qualified(&self, teacher: usize, subject: usize, group: usize) -> bool {
        let t = self.teacher(teacher);
        let s = self.subject(subject);
        s.teacher_ids.iter().any(|id| *id == t.id)
            && t.teaches(s)
            && t.is_assigned_to(&self.group(group).id)
    }

    /// Checks whether a room can host a session of `subject` for `group`.
    ///
    /// Ownership is only checked when a teacher is given.
    pub fn room_fit(
        &self,
        subject: usize,
        group: usize,
        room: usize,
        teacher: Option<usize>,
    ) -> RoomFit {
        let s = self.subject(subject);
        let r = self.classroom(room);
        if !r.classroom_type.serves(s.subject_type) {
            return RoomFit::WrongType;
        }
        if r.classroom_type == ClassroomType::Lab {
            let fits = if self.has_specialized_lab[subject] {
                r.specializes_in(&s.id)
            } else {
                !r.is_specialized()
            };
            if !fits {
                return RoomFit::NotSpecialized;
            }
        }
        if r.capacity < self.group(group).students_count {
            return RoomFit::TooSmall;
        }
        if r.classroom_type == ClassroomType::TeacherLab {
            if let (Some(owner), Some(t)) = (self.lab_owner[room], teacher) {
                if owner != t {
                    return RoomFit::OwnedByOther;
                }
            }
        }
        RoomFit::Suitable
    }

    /// Preferred rooms for a session, restricted to suitable ones.
    ///
    /// The group's home classroom is preferred for theory subjects; a
    /// teacher's own lab is preferred whenever it fits.
    pub fn preferred_rooms(&self, group: usize, subject: usize, teacher: usize) -> Vec<usize> {
        let mut rooms = Vec::with_capacity(2);
        if self.subject(subject).subject_type == SubjectType::Theory {
            if let Some(r) = self.group(group).home_classroom.as_deref().and_then(|id| self.classroom_index(id)) {
                rooms.push(r);
            }
        }
        if let Some(r) = self.teacher(teacher).home_classroom.as_deref().and_then(|id| self.classroom_index(id)) {
            if !rooms.contains(&r) {
                rooms.push(r);
            }
        }
        rooms.retain(|&r| self.room_fit(subject, group, r, Some(teacher)).is_suitable());
        rooms
    }

    /// Whether `room` is a preferred room for the session.
    pub fn is_preferred_room(&self, group: usize, subject: usize, teacher: usize, room: usize) -> bool {
        self.preferred_rooms(group, subject, teacher).contains(&room)
    }
}

fn index_by<'a>(ids: impl Iterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    ids.enumerate().map(|(i, id)| (id, i)).collect()
}
