//! Timetable quality metrics (KPIs).
//!
//! Computes load and utilization indicators from a timetable and the
//! snapshot it was generated for.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Daily load | Sessions per group per working day |
//! | Max daily spread | Largest (max - min) daily load of any group |
//! | Teacher utilization | Sessions / available lessons inside the grid |
//! | Classroom utilization | Sessions / grid slots |
//! | Foreign lab sessions | Teacher-lab sessions taught by a non-owner |
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling", Sec. 2.1

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{ClassroomType, ScheduleSlot, Snapshot};

/// Groups whose daily spread exceeds this are reported as uneven.
pub const UNEVEN_SPREAD: u32 = 2;

/// Timetable performance indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Number of sessions.
    pub session_count: usize,
    /// Sessions per working day, by group.
    pub daily_load_by_group: BTreeMap<String, Vec<u32>>,
    /// Largest daily spread over all groups.
    pub max_daily_spread: u32,
    /// Groups with a spread above [`UNEVEN_SPREAD`].
    pub uneven_groups: Vec<String>,
    /// Per-teacher utilization (0.0..1.0).
    pub teacher_utilization: BTreeMap<String, f64>,
    /// Mean teacher utilization over teachers with availability.
    pub avg_teacher_utilization: f64,
    /// Per-classroom utilization (0.0..1.0).
    pub classroom_utilization: BTreeMap<String, f64>,
    /// Teacher-lab sessions taught by someone other than the owner.
    pub foreign_lab_sessions: usize,
}

impl ScheduleKpi {
    /// Computes KPIs of a timetable.
    ///
    /// Entries with unknown days are counted as sessions but not in the
    /// daily loads.
    pub fn calculate(slots: &[ScheduleSlot], snapshot: &Snapshot) -> Self {
        let institution = &snapshot.institution;
        let day_count = institution.working_days.len();
        let grid_size = day_count * institution.lessons_per_day as usize;

        let mut daily_load_by_group: BTreeMap<String, Vec<u32>> = snapshot
            .class_groups
            .iter()
            .map(|g| (g.id.clone(), vec![0; day_count]))
            .collect();
        let mut teacher_sessions: BTreeMap<&str, usize> = BTreeMap::new();
        let mut classroom_sessions: BTreeMap<&str, usize> = BTreeMap::new();
        let mut foreign_lab_sessions = 0;

        for slot in slots {
            let day = institution.working_days.iter().position(|d| *d == slot.day);
            if let (Some(day), Some(load)) = (day, daily_load_by_group.get_mut(&slot.class_group_id)) {
                load[day] += 1;
            }
            *teacher_sessions.entry(slot.teacher_id.as_str()).or_default() += 1;
            *classroom_sessions.entry(slot.classroom_id.as_str()).or_default() += 1;

            let is_teacher_lab = snapshot
                .classroom(&slot.classroom_id)
                .is_some_and(|r| r.classroom_type == ClassroomType::TeacherLab);
            if is_teacher_lab {
                if let Some(owner) = snapshot.lab_owner(&slot.classroom_id) {
                    if owner.id != slot.teacher_id {
                        foreign_lab_sessions += 1;
                    }
                }
            }
        }

        let mut max_daily_spread = 0;
        let mut uneven_groups = Vec::new();
        for (group, load) in &daily_load_by_group {
            let spread = match (load.iter().max(), load.iter().min()) {
                (Some(max), Some(min)) => max - min,
                _ => 0,
            };
            max_daily_spread = max_daily_spread.max(spread);
            if spread > UNEVEN_SPREAD {
                uneven_groups.push(group.clone());
            }
        }

        let teacher_utilization: BTreeMap<String, f64> = snapshot
            .teachers
            .iter()
            .filter_map(|t| {
                let available = t.available_lesson_count(institution);
                if available == 0 {
                    return None;
                }
                let used = teacher_sessions.get(t.id.as_str()).copied().unwrap_or(0);
                Some((t.id.clone(), used as f64 / available as f64))
            })
            .collect();
        let avg_teacher_utilization = if teacher_utilization.is_empty() {
            0.0
        } else {
            teacher_utilization.values().sum::<f64>() / teacher_utilization.len() as f64
        };

        let classroom_utilization = snapshot
            .classrooms
            .iter()
            .map(|r| {
                let used = classroom_sessions.get(r.id.as_str()).copied().unwrap_or(0);
                let utilization = if grid_size == 0 {
                    0.0
                } else {
                    used as f64 / grid_size as f64
                };
                (r.id.clone(), utilization)
            })
            .collect();

        Self {
            session_count: slots.len(),
            daily_load_by_group,
            max_daily_spread,
            uneven_groups,
            teacher_utilization,
            avg_teacher_utilization,
            classroom_utilization,
            foreign_lab_sessions,
        }
    }

    /// Whether the timetable meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_spread: u32, min_teacher_utilization: f64) -> bool {
        self.max_daily_spread <= max_spread && self.avg_teacher_utilization >= min_teacher_utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classroom;
    use crate::testing;

    #[test]
    fn test_kpi_basic() {
        let snap = testing::trivial_snapshot();
        let slots = vec![
            testing::entry("G1", "MATH", "T1", "R1", "Monday", 1),
            testing::entry("G1", "MATH", "T1", "R1", "Wednesday", 1),
        ];

        let kpi = ScheduleKpi::calculate(&slots, &snap);
        assert_eq!(kpi.session_count, 2);
        assert_eq!(kpi.daily_load_by_group["G1"], vec![1, 0, 1, 0, 0]);
        assert_eq!(kpi.max_daily_spread, 1);
        assert!(kpi.uneven_groups.is_empty());
        // 2 of 25 available lessons
        assert!((kpi.teacher_utilization["T1"] - 0.08).abs() < 1e-10);
        assert!((kpi.avg_teacher_utilization - 0.08).abs() < 1e-10);
        assert!((kpi.classroom_utilization["R1"] - 0.08).abs() < 1e-10);
        assert_eq!(kpi.foreign_lab_sessions, 0);
    }

    #[test]
    fn test_utilization_ignores_availability_outside_grid() {
        let mut snap = testing::trivial_snapshot();
        snap.teachers[0] = snap.teachers[0]
            .clone()
            .with_availability("Sunday", [1, 2, 3])
            .with_availability("Monday", [9]);
        let slots = vec![
            testing::entry("G1", "MATH", "T1", "R1", "Monday", 1),
            testing::entry("G1", "MATH", "T1", "R1", "Wednesday", 1),
        ];

        let kpi = ScheduleKpi::calculate(&slots, &snap);
        // still 2 of the 25 grid lessons
        assert!((kpi.teacher_utilization["T1"] - 0.08).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_uneven_group() {
        let snap = testing::trivial_snapshot();
        let slots: Vec<_> = (1..=3)
            .map(|lesson| testing::entry("G1", "MATH", "T1", "R1", "Tuesday", lesson))
            .collect();

        let kpi = ScheduleKpi::calculate(&slots, &snap);
        assert_eq!(kpi.max_daily_spread, 3);
        assert_eq!(kpi.uneven_groups, vec!["G1".to_string()]);
    }

    #[test]
    fn test_kpi_foreign_lab() {
        let mut snap = testing::trivial_snapshot()
            .with_classroom(Classroom::teacher_lab("TL"))
            .with_teacher(testing::full_time_teacher("T9", "Mathematics").with_group("G1"));
        snap.teachers[1].home_classroom = Some("TL".into());
        let slots = vec![
            testing::entry("G1", "MATH", "T1", "TL", "Monday", 1),
            testing::entry("G1", "MATH", "T9", "TL", "Monday", 2),
        ];

        let kpi = ScheduleKpi::calculate(&slots, &snap);
        assert_eq!(kpi.foreign_lab_sessions, 1);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = ScheduleKpi::calculate(&[], &testing::trivial_snapshot());
        assert_eq!(kpi.session_count, 0);
        assert_eq!(kpi.max_daily_spread, 0);
        assert!((kpi.avg_teacher_utilization - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_meets_thresholds() {
        let snap = testing::trivial_snapshot();
        let slots = vec![
            testing::entry("G1", "MATH", "T1", "R1", "Monday", 1),
            testing::entry("G1", "MATH", "T1", "R1", "Monday", 2),
        ];

        let kpi = ScheduleKpi::calculate(&slots, &snap);
        assert!(kpi.meets_thresholds(2, 0.0));
        assert!(!kpi.meets_thresholds(1, 0.0));
        assert!(!kpi.meets_thresholds(2, 0.5)); // Utilization too low
    }
}
