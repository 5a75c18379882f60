//! Shared fixtures and end-to-end scenarios.

use crate::demand::Demand;
use crate::grid::SlotGrid;
use crate::models::{
    ClassGroup, Classroom, ClockTime, Institution, ScheduleSlot, Snapshot, Subject, SubjectType,
    Teacher,
};

/// Monday..Friday, five lessons a day, 40 academic weeks.
pub(crate) fn institution() -> Institution {
    Institution::new("College").with_lessons_per_day(5)
}

/// A teacher available at every lesson of [`institution`].
pub(crate) fn full_time_teacher(id: &str, subject_name: &str) -> Teacher {
    let inst = institution();
    Teacher::new(id)
        .with_subject(subject_name)
        .available_all(inst.working_days.clone(), inst.lessons_per_day)
}

/// One group needing two weekly MATH sessions, one teacher, one room.
pub(crate) fn trivial_snapshot() -> Snapshot {
    Snapshot::new(institution())
        .with_group(ClassGroup::new("G1").with_subject_hours("MATH", 80))
        .with_subject(Subject::theory("MATH", "Mathematics").with_teacher("T1"))
        .with_classroom(Classroom::theory("R1"))
        .with_teacher(full_time_teacher("T1", "Mathematics").with_group("G1"))
}

/// The trivial snapshot with T1 available on Monday lesson 1 only.
pub(crate) fn limited_availability_snapshot() -> Snapshot {
    let mut snap = trivial_snapshot();
    snap.teachers[0] = Teacher::new("T1")
        .with_subject("Mathematics")
        .with_group("G1")
        .with_availability("Monday", [1]);
    snap
}

/// The trivial snapshot with T1 never available.
pub(crate) fn unavailable_teacher_snapshot() -> Snapshot {
    let mut snap = trivial_snapshot();
    snap.teachers[0].available_hours.clear();
    snap
}

/// 30 students, and the only theory room seats 20.
pub(crate) fn capacity_conflict_snapshot() -> Snapshot {
    let mut snap = trivial_snapshot();
    snap.class_groups[0].students_count = 30;
    snap.classrooms[0].capacity = 20;
    snap
}

/// One group with a theory subject and two lab subjects, one of which
/// has a specialized lab.
pub(crate) fn lab_snapshot() -> Snapshot {
    Snapshot::new(institution())
        .with_group(
            ClassGroup::new("G1")
                .with_students(30)
                .with_subject_hours("MATH", 40)
                .with_subject_hours("CHEM", 40)
                .with_subject_hours("BIO", 40),
        )
        .with_subject(Subject::theory("MATH", "Mathematics").with_teacher("T1"))
        .with_subject(Subject::lab("CHEM", "Chemistry").with_teacher("T2"))
        .with_subject(Subject::lab("BIO", "Biology").with_teacher("T2"))
        .with_classroom(Classroom::theory("R1"))
        .with_classroom(Classroom::theory("RSMALL").with_capacity(20))
        .with_classroom(Classroom::lab("LCHEM").with_specialization("CHEM"))
        .with_classroom(Classroom::lab("LGEN"))
        .with_teacher(full_time_teacher("T1", "Mathematics").with_group("G1"))
        .with_teacher(
            full_time_teacher("T2", "Chemistry")
                .with_subject("Biology")
                .with_group("G1"),
        )
}

/// One day of three lessons; MATH twice and PHYS once for one group.
pub(crate) fn swap_snapshot() -> Snapshot {
    let inst = Institution::new("College")
        .with_working_days(["Monday"])
        .with_lessons_per_day(3);
    Snapshot::new(inst)
        .with_group(
            ClassGroup::new("G1")
                .with_subject_hours("MATH", 80)
                .with_subject_hours("PHYS", 40),
        )
        .with_subject(Subject::theory("MATH", "Mathematics").with_teacher("T1"))
        .with_subject(Subject::theory("PHYS", "Physics").with_teacher("T1"))
        .with_classroom(Classroom::theory("R1"))
        .with_teacher(
            Teacher::new("T1")
                .with_subject("Mathematics")
                .with_subject("Physics")
                .with_group("G1")
                .with_availability("Monday", 1..=3),
        )
}

/// A feasible instance on which the first choice is wrong.
///
/// One day of three lessons. LABP takes the only general lab at lesson 1
/// or 2; group GB needs LABW twice in that lab plus THZ at lesson 2 or 3,
/// so LABW must take lesson 1. LABU is independent of the rest.
pub(crate) fn tight_snapshot() -> Snapshot {
    let inst = Institution::new("College")
        .with_working_days(["Monday"])
        .with_lessons_per_day(3);
    Snapshot::new(inst)
        .with_group(ClassGroup::new("GA").with_subject_hours("LABP", 40))
        .with_group(
            ClassGroup::new("GB")
                .with_subject_hours("LABW", 80)
                .with_subject_hours("THZ", 40),
        )
        .with_group(ClassGroup::new("GC").with_subject_hours("LABU", 40))
        .with_subject(Subject::lab("LABP", "LABP").with_teacher("TP"))
        .with_subject(
            Subject::lab("LABW", "LABW")
                .with_teacher("T1")
                .with_teacher("T1B"),
        )
        .with_subject(Subject::theory("THZ", "THZ").with_teacher("T2"))
        .with_subject(Subject::lab("LABU", "LABU").with_teacher("TU"))
        .with_classroom(Classroom::theory("R"))
        .with_classroom(Classroom::lab("L"))
        .with_classroom(Classroom::lab("LU").with_specialization("LABU"))
        .with_teacher(
            Teacher::new("TP")
                .with_subject("LABP")
                .with_group("GA")
                .with_availability("Monday", [1, 2]),
        )
        .with_teacher(
            Teacher::new("T1")
                .with_subject("LABW")
                .with_group("GB")
                .with_availability("Monday", 1..=3),
        )
        .with_teacher(
            Teacher::new("T1B")
                .with_subject("LABW")
                .with_group("GB")
                .with_availability("Monday", 1..=3),
        )
        .with_teacher(
            Teacher::new("T2")
                .with_subject("THZ")
                .with_group("GB")
                .with_availability("Monday", [2, 3]),
        )
        .with_teacher(
            Teacher::new("TU")
                .with_subject("LABU")
                .with_group("GC")
                .with_availability("Monday", [1, 2]),
        )
}

/// Two groups each need two sessions from one teacher who has two
/// lessons. Each demand fits alone; together they cannot.
pub(crate) fn shared_teacher_overbooked_snapshot() -> Snapshot {
    let inst = Institution::new("College")
        .with_working_days(["Monday"])
        .with_lessons_per_day(2);
    Snapshot::new(inst)
        .with_group(ClassGroup::new("GA").with_subject_hours("MATH", 80))
        .with_group(ClassGroup::new("GB").with_subject_hours("MATH", 80))
        .with_subject(Subject::theory("MATH", "Mathematics").with_teacher("T1"))
        .with_classroom(Classroom::theory("R1"))
        .with_classroom(Classroom::theory("R2"))
        .with_teacher(
            Teacher::new("T1")
                .with_subject("Mathematics")
                .with_group("GA")
                .with_group("GB")
                .with_availability("Monday", [1, 2]),
        )
}

/// Two groups, theory and lab subjects, a home room and a teacher lab.
pub(crate) fn college_snapshot() -> Snapshot {
    let inst = Institution::new("College");
    let days = inst.working_days.clone();
    let lessons = inst.lessons_per_day;
    Snapshot::new(inst)
        .with_group(
            ClassGroup::new("G1")
                .with_subject_hours("MATH", 160)
                .with_subject_hours("PHYS", 80)
                .with_subject_hours("CHEM", 80)
                .with_subject_hours("INFO", 40),
        )
        .with_group(
            ClassGroup::new("G2")
                .with_students(28)
                .with_home_classroom("R2")
                .with_subject_hours("MATH", 120)
                .with_subject_hours("PHYS", 80)
                .with_subject_hours("CHEM", 40),
        )
        .with_subject(Subject::theory("MATH", "Mathematics").with_teacher("T1"))
        .with_subject(Subject::theory("PHYS", "Physics").with_teacher("T2"))
        .with_subject(Subject::lab("CHEM", "Chemistry").with_teacher("T3"))
        .with_subject(Subject::lab("INFO", "Informatics").with_teacher("T2"))
        .with_classroom(Classroom::theory("R1"))
        .with_classroom(Classroom::theory("R2"))
        .with_classroom(Classroom::lab("LCHEM").with_specialization("CHEM"))
        .with_classroom(Classroom::lab("LCOMP").with_computers())
        .with_classroom(Classroom::teacher_lab("TL"))
        .with_teacher(
            Teacher::new("T1")
                .with_subject("Mathematics")
                .with_group("G1")
                .with_group("G2")
                .available_all(days.clone(), lessons),
        )
        .with_teacher(
            Teacher::new("T2")
                .with_subject("Physics")
                .with_subject("Informatics")
                .with_group("G1")
                .with_group("G2")
                .with_home_classroom("TL")
                .available_all(days[..4].to_vec(), lessons),
        )
        .with_teacher(
            Teacher::new("T3")
                .with_subject("Chemistry")
                .with_group("G1")
                .with_group("G2")
                .available_all(days, lessons),
        )
}

/// A schedule entry with the clock times of [`institution`]'s grid.
///
/// Entries off that grid get 00:00 times.
pub(crate) fn entry(
    group: &str,
    subject: &str,
    teacher: &str,
    classroom: &str,
    day: &str,
    lesson: u32,
) -> ScheduleSlot {
    let grid = SlotGrid::new(&institution()).unwrap();
    let (start_time, end_time) = grid
        .locate(day, lesson)
        .map(|i| (grid.slot(i).start, grid.slot(i).end))
        .unwrap_or((ClockTime::from_minutes(0), ClockTime::from_minutes(0)));
    ScheduleSlot {
        day: day.into(),
        lesson_number: lesson,
        class_group_id: group.into(),
        subject_id: subject.into(),
        teacher_id: teacher.into(),
        classroom_id: classroom.into(),
        start_time,
        end_time,
    }
}

/// A standalone demand for ordering tests.
pub(crate) fn demand(index: usize, weekly_count: u32, lab: bool, students: u32) -> Demand {
    Demand {
        index,
        class_group_id: format!("G{index}"),
        subject_id: "S".into(),
        group: index,
        subject: 0,
        subject_type: if lab {
            SubjectType::Lab
        } else {
            SubjectType::Theory
        },
        weekly_count,
        students,
        annual_hours: weekly_count * 40,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::{EngineConfig, GenerationConstraints};
    use crate::demand::{DemandStatus, RoundingPolicy};
    use crate::error::GenerationError;
    use crate::scheduler::{
        BlockedResource, CancellationToken, InfeasibilityCause, Recommendation, TimetableGenerator,
    };
    use crate::{generate, validate};

    fn sessions_by_demand(slots: &[ScheduleSlot]) -> BTreeMap<(String, String), usize> {
        let mut counts = BTreeMap::new();
        for s in slots {
            *counts
                .entry((s.class_group_id.clone(), s.subject_id.clone()))
                .or_default() += 1;
        }
        counts
    }

    #[test]
    fn test_trivial_feasible() {
        let snap = trivial_snapshot();
        let slots = generate(&snap, &GenerationConstraints::default(), &[]).unwrap();

        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.subject_id == "MATH" && s.teacher_id == "T1"));
        assert_ne!(slots[0].day, slots[1].day);
        assert!(validate(&slots, &snap).is_ok());
    }

    #[test]
    fn test_college_timetable_is_sound() {
        let snap = college_snapshot();
        let slots = generate(&snap, &GenerationConstraints::default(), &[]).unwrap();

        assert_eq!(validate(&slots, &snap), Ok(()));
        let counts = sessions_by_demand(&slots);
        assert_eq!(counts[&("G1".to_string(), "MATH".to_string())], 4);
        assert_eq!(counts[&("G1".to_string(), "INFO".to_string())], 1);
        assert_eq!(counts[&("G2".to_string(), "CHEM".to_string())], 1);
        assert_eq!(slots.len(), 15);
        // T2 does not work on Friday
        assert!(slots
            .iter()
            .filter(|s| s.teacher_id == "T2")
            .all(|s| s.day != "Friday"));
        // CHEM has a specialized lab
        assert!(slots
            .iter()
            .filter(|s| s.subject_id == "CHEM")
            .all(|s| s.classroom_id == "LCHEM"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let snap = college_snapshot();
        let constraints = GenerationConstraints::default();
        let (a, b) = std::thread::scope(|s| {
            let first = s.spawn(|| generate(&snap, &constraints, &[]).unwrap());
            let second = s.spawn(|| generate(&snap, &constraints, &[]).unwrap());
            (first.join().unwrap(), second.join().unwrap())
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_unavailable_teacher_is_infeasible() {
        let snap = unavailable_teacher_snapshot();
        let err = generate(&snap, &GenerationConstraints::default(), &[]).unwrap_err();
        let report = err.infeasibility().unwrap();

        assert_eq!(report.class_group_id, "G1");
        assert_eq!(report.subject_id, "MATH");
        assert_eq!(report.cause, InfeasibilityCause::NoEligibleCandidates);
        assert_eq!(
            report.blocked,
            BlockedResource::Teacher {
                teacher_ids: vec!["T1".into()]
            }
        );
    }

    #[test]
    fn test_capacity_conflict_is_infeasible() {
        let snap = capacity_conflict_snapshot();
        let err = generate(&snap, &GenerationConstraints::default(), &[]).unwrap_err();
        let report = err.infeasibility().unwrap();
        assert!(matches!(report.blocked, BlockedResource::Classroom { .. }));
        assert_eq!(report.recommendation, Recommendation::AddClassroom);
    }

    #[test]
    fn test_search_proves_infeasibility() {
        let snap = shared_teacher_overbooked_snapshot();
        let err = generate(&snap, &GenerationConstraints::default(), &[]).unwrap_err();
        let report = err.infeasibility().unwrap();

        assert_eq!(report.cause, InfeasibilityCause::SearchExhausted);
        assert_eq!(
            report.blocked,
            BlockedResource::Teacher {
                teacher_ids: vec!["T1".into()]
            }
        );
        assert_eq!(report.recommendation, Recommendation::WidenTeacherAvailability);
        assert!(report.summary.teacher_prunes > 0);
        assert!(err.to_string().contains("increase teacher availability"));
    }

    #[test]
    fn test_group_overload_is_infeasible() {
        let mut snap = trivial_snapshot();
        snap.class_groups[0].subject_hours.insert("MATH".into(), 26 * 40);
        let err = generate(&snap, &GenerationConstraints::default(), &[]).unwrap_err();
        assert_eq!(
            err.infeasibility().map(|r| r.cause),
            Some(InfeasibilityCause::GroupOverloaded)
        );
    }

    #[test]
    fn test_stale_snapshot_is_configuration_error() {
        let snap = trivial_snapshot().with_group(ClassGroup::new("G2").with_subject_hours("GONE", 40));
        let err = generate(&snap, &GenerationConstraints::default(), &[]).unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[test]
    fn test_backtrack_budget() {
        let snap = tight_snapshot();
        let generator =
            TimetableGenerator::new().with_config(EngineConfig::default().with_max_backtracks(1));
        let err = generator
            .generate(&snap, &GenerationConstraints::none(), &[])
            .unwrap_err();
        match err {
            GenerationError::BacktrackBudgetExceeded {
                budget,
                placed,
                required,
            } => {
                assert_eq!(budget, 1);
                assert_eq!(required, 5);
                assert!(placed < required);
            }
            other => panic!("expected budget error, got {other:?}"),
        }

        let slots = TimetableGenerator::new()
            .generate(&snap, &GenerationConstraints::none(), &[])
            .unwrap();
        assert_eq!(validate(&slots, &snap), Ok(()));
    }

    #[test]
    fn test_cancelled_run() {
        let token = CancellationToken::new();
        let generator = TimetableGenerator::new().with_cancellation(token.clone());
        token.cancel();
        let err = generator
            .generate(&college_snapshot(), &GenerationConstraints::default(), &[])
            .unwrap_err();
        assert!(matches!(err, GenerationError::Cancelled));
    }

    #[test]
    fn test_lab_sessions_stay_in_place() {
        let snap = lab_snapshot();
        let previous = vec![entry("G1", "CHEM", "T2", "LCHEM", "Tuesday", 2)];
        let slots = generate(&snap, &GenerationConstraints::default(), &previous).unwrap();

        let chem: Vec<_> = slots.iter().filter(|s| s.subject_id == "CHEM").collect();
        assert_eq!(chem.len(), 1);
        assert_eq!((chem[0].day.as_str(), chem[0].lesson_number), ("Tuesday", 2));
        assert_eq!(chem[0].classroom_id, "LCHEM");
    }

    #[test]
    fn test_report_has_kpis() {
        let snap = college_snapshot();
        let report = TimetableGenerator::new()
            .generate_report(&snap, &GenerationConstraints::default(), &[])
            .unwrap();
        assert_eq!(report.kpi.session_count, report.slots.len());
        assert_eq!(report.kpi.foreign_lab_sessions, 0);
        assert!(report.stats.decisions >= report.slots.len() as u64);
    }

    #[test]
    fn test_config_from_toml_drives_run() {
        let config = EngineConfig::from_toml_str(
            r#"
            [optimization]
            enabled = false
            "#,
        )
        .unwrap();
        let mut snap = trivial_snapshot();
        snap.institution.hours_rounding = RoundingPolicy::Floor;
        snap.class_groups[0].subject_hours.insert("MATH".into(), 119);
        let slots = TimetableGenerator::new()
            .with_config(config)
            .generate(&snap, &GenerationConstraints::default(), &[])
            .unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(validate(&slots, &snap), Ok(()));
    }

    #[test]
    fn test_non_default_rounding_validates() {
        let mut snap = trivial_snapshot();
        snap.class_groups[0].subject_hours.insert("MATH".into(), 90);

        snap.institution.hours_rounding = RoundingPolicy::Ceil;
        let slots = generate(&snap, &GenerationConstraints::default(), &[]).unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(validate(&slots, &snap), Ok(()));

        snap.institution.hours_rounding = RoundingPolicy::Floor;
        let slots = generate(&snap, &GenerationConstraints::default(), &[]).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(validate(&slots, &snap), Ok(()));
    }

    #[test]
    fn test_extreme_hours_are_overload() {
        let mut snap = trivial_snapshot();
        snap.class_groups[0].subject_hours.insert("MATH".into(), u32::MAX);
        let err = generate(&snap, &GenerationConstraints::default(), &[]).unwrap_err();
        assert_eq!(
            err.infeasibility().map(|r| r.cause),
            Some(InfeasibilityCause::GroupOverloaded)
        );
    }

    #[test]
    fn test_extreme_duration_is_configuration_error() {
        let mut snap = trivial_snapshot();
        snap.institution.lesson_duration_min = u32::MAX;
        let err = generate(&snap, &GenerationConstraints::default(), &[]).unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[test]
    fn test_infeasible_run_reports_progress() {
        let snap = shared_teacher_overbooked_snapshot();
        let err = generate(&snap, &GenerationConstraints::default(), &[]).unwrap_err();
        let report = err.infeasibility().unwrap();

        assert_eq!(report.progress.len(), 2);
        let blocked: Vec<_> = report
            .progress
            .iter()
            .filter(|p| p.status == DemandStatus::Infeasible)
            .collect();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].subject_id, report.subject_id);
        assert_eq!(blocked[0].class_group_id, report.class_group_id);
        assert!(report.progress.iter().all(|p| p.weekly_count == 2));
    }
}
