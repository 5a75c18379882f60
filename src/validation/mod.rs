//! Input and output validation.
//!
//! - [`validate_snapshot`] checks the structural integrity of a snapshot
//!   before any scheduling work: duplicate IDs, stale cross-references,
//!   and institution settings that cannot form a grid.
//! - [`validate`] audits a finished timetable against every hard rule,
//!   independently of the solver's bookkeeping (see [`audit`]).

pub mod audit;

pub use audit::validate;

use std::collections::HashSet;

use crate::error::{ConfigurationError, ConfigurationIssue, IssueKind};
use crate::grid::SlotGrid;
use crate::models::Snapshot;

/// Validates a snapshot.
///
/// Checks:
/// 1. No duplicate group, subject, classroom or teacher IDs
/// 2. Every subject with positive hours in a group exists
/// 3. Every home classroom (group or teacher) exists
/// 4. Every eligible teacher of a subject exists
/// 5. Every group a teacher is assigned to exists
/// 6. The institution forms a valid grid and has positive academic weeks
///
/// # Returns
/// `Ok(())` if all checks pass, `Err` with every detected issue.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), ConfigurationError> {
    let mut issues = Vec::new();

    let group_ids = collect_ids(
        snapshot.class_groups.iter().map(|g| g.id.as_str()),
        "group",
        &mut issues,
    );
    let subject_ids = collect_ids(
        snapshot.subjects.iter().map(|s| s.id.as_str()),
        "subject",
        &mut issues,
    );
    let classroom_ids = collect_ids(
        snapshot.classrooms.iter().map(|c| c.id.as_str()),
        "classroom",
        &mut issues,
    );
    let teacher_ids = collect_ids(
        snapshot.teachers.iter().map(|t| t.id.as_str()),
        "teacher",
        &mut issues,
    );

    for group in &snapshot.class_groups {
        for (subject_id, &hours) in &group.subject_hours {
            if hours > 0 && !subject_ids.contains(subject_id.as_str()) {
                issues.push(ConfigurationIssue::new(
                    IssueKind::UnknownSubject,
                    format!("Group '{}' requires unknown subject '{}'", group.id, subject_id),
                ));
            }
        }
        if let Some(room) = &group.home_classroom {
            if !classroom_ids.contains(room.as_str()) {
                issues.push(ConfigurationIssue::new(
                    IssueKind::UnknownClassroom,
                    format!("Group '{}' has unknown home classroom '{}'", group.id, room),
                ));
            }
        }
    }

    for subject in &snapshot.subjects {
        for teacher_id in &subject.teacher_ids {
            if !teacher_ids.contains(teacher_id.as_str()) {
                issues.push(ConfigurationIssue::new(
                    IssueKind::UnknownTeacher,
                    format!(
                        "Subject '{}' lists unknown teacher '{}'",
                        subject.id, teacher_id
                    ),
                ));
            }
        }
    }

    for teacher in &snapshot.teachers {
        if let Some(room) = &teacher.home_classroom {
            if !classroom_ids.contains(room.as_str()) {
                issues.push(ConfigurationIssue::new(
                    IssueKind::UnknownClassroom,
                    format!("Teacher '{}' owns unknown classroom '{}'", teacher.id, room),
                ));
            }
        }
        for group_id in &teacher.assigned_class_groups {
            if !group_ids.contains(group_id.as_str()) {
                issues.push(ConfigurationIssue::new(
                    IssueKind::UnknownGroup,
                    format!(
                        "Teacher '{}' is assigned to unknown group '{}'",
                        teacher.id, group_id
                    ),
                ));
            }
        }
    }

    if let Err(err) = SlotGrid::new(&snapshot.institution) {
        issues.push(ConfigurationIssue::new(
            IssueKind::InvalidInstitution,
            err.to_string(),
        ));
    }
    if snapshot.institution.academic_weeks == 0 {
        issues.push(ConfigurationIssue::new(
            IssueKind::InvalidInstitution,
            "academic weeks must be positive",
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConfigurationError::new(issues))
    }
}

fn collect_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    what: &str,
    issues: &mut Vec<ConfigurationIssue>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            issues.push(ConfigurationIssue::new(
                IssueKind::DuplicateId,
                format!("Duplicate {what} ID: {id}"),
            ));
        }
    }
    seen
}
