//! Teacher model.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Institution, Subject};

/// A teacher with qualifications, weekly availability and group assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Names of the subjects this teacher teaches.
    pub subjects: BTreeSet<String>,
    /// Available lesson numbers per working day.
    pub available_hours: BTreeMap<String, BTreeSet<u32>>,
    /// Groups this teacher is assigned to.
    pub assigned_class_groups: BTreeSet<String>,
    /// The teacher lab this teacher owns, if any.
    pub home_classroom: Option<String>,
}

impl Teacher {
    /// Creates a teacher without subjects, availability or groups.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: String::new(),
            last_name: String::new(),
            subjects: BTreeSet::new(),
            available_hours: BTreeMap::new(),
            assigned_class_groups: BTreeSet::new(),
            home_classroom: None,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    /// Adds a taught subject (by name).
    pub fn with_subject(mut self, subject_name: impl Into<String>) -> Self {
        self.subjects.insert(subject_name.into());
        self
    }

    /// Adds available lessons on a day.
    pub fn with_availability<I>(mut self, day: impl Into<String>, lessons: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        self.available_hours
            .entry(day.into())
            .or_default()
            .extend(lessons);
        self
    }

    /// Makes every lesson of the given days available.
    pub fn available_all<I, S>(mut self, days: I, lessons_per_day: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for day in days {
            self = self.with_availability(day, 1..=lessons_per_day);
        }
        self
    }

    /// Assigns the teacher to a group.
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.assigned_class_groups.insert(group_id.into());
        self
    }

    /// Sets the owned teacher lab.
    pub fn with_home_classroom(mut self, classroom_id: impl Into<String>) -> Self {
        self.home_classroom = Some(classroom_id.into());
        self
    }

    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Whether the taught set covers the subject (by name or ID).
    pub fn teaches(&self, subject: &Subject) -> bool {
        self.subjects.contains(&subject.name) || self.subjects.contains(&subject.id)
    }

    /// Whether the teacher is assigned to the group.
    pub fn is_assigned_to(&self, group_id: &str) -> bool {
        self.assigned_class_groups.contains(group_id)
    }

    /// Whether the teacher can teach the given lesson on the given day.
    pub fn is_available(&self, day: &str, lesson_number: u32) -> bool {
        self.available_hours
            .get(day)
            .is_some_and(|lessons| lessons.contains(&lesson_number))
    }

    /// Available lessons that fall inside the week of an institution.
    ///
    /// Days outside `working_days` and lesson numbers above
    /// `lessons_per_day` are ignored.
    pub fn available_lesson_count(&self, institution: &Institution) -> usize {
        institution
            .working_days
            .iter()
            .filter_map(|day| self.available_hours.get(day))
            .map(|lessons| lessons.range(1..=institution.lessons_per_day).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_builder() {
        let t = Teacher::new("T1")
            .with_name("Ada", "Lovelace")
            .with_subject("Mathematics")
            .with_availability("Monday", [1, 2])
            .with_availability("Monday", [4])
            .with_group("G1")
            .with_home_classroom("TL1");

        assert_eq!(t.full_name(), "Ada Lovelace");
        assert!(t.is_available("Monday", 4));
        assert!(!t.is_available("Monday", 3));
        assert!(!t.is_available("Tuesday", 1));
        let inst = Institution::new("College");
        assert_eq!(t.available_lesson_count(&inst), 3);
        assert!(t.is_assigned_to("G1"));
        assert!(!t.is_assigned_to("G2"));
    }

    #[test]
    fn test_teaches_by_name_or_id() {
        let math = Subject::theory("MATH", "Mathematics");
        assert!(Teacher::new("T1").with_subject("Mathematics").teaches(&math));
        assert!(Teacher::new("T2").with_subject("MATH").teaches(&math));
        assert!(!Teacher::new("T3").with_subject("Physics").teaches(&math));
    }

    #[test]
    fn test_available_all() {
        let t = Teacher::new("T1").available_all(["Mon", "Tue"], 3);
        let inst = Institution::new("College")
            .with_working_days(["Mon", "Tue"])
            .with_lessons_per_day(3);
        assert_eq!(t.available_lesson_count(&inst), 6);
        assert!(t.is_available("Tue", 3));
    }

    #[test]
    fn test_availability_outside_week_not_counted() {
        let t = Teacher::new("T1")
            .with_availability("Monday", [1, 2, 9])
            .with_availability("Sunday", [1, 2]);
        let inst = Institution::new("College").with_lessons_per_day(5);
        assert_eq!(t.available_lesson_count(&inst), 2);
    }
}
