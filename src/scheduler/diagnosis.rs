//! Infeasibility diagnosis.
//!
//! Explains why a demand cannot be placed: which resource dimension
//! blocks it, a summary of the conflicts seen, and what to change.
//!
//! # Static Checks (before search)
//!
//! 1. A group needs more weekly sessions than the grid has slots
//! 2. A demand has fewer candidate slots than weekly sessions
//!
//! # Blocking Dimension
//!
//! | Evidence | Blocked | Recommendation |
//! |----------|---------|----------------|
//! | no qualified teacher | Teacher | assign a qualified teacher |
//! | qualified teachers never available | Teacher | widen availability |
//! | no suitable classroom | Classroom | add a classroom |
//! | too few available slots | Teacher | widen availability |
//! | search prunes mostly by teacher | Teacher | widen availability |
//! | search prunes mostly by classroom | Classroom | add a classroom |
//! | otherwise | Slot | reduce group load / adjust resources |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::constraints::RuleContext;
use crate::demand::{DemandProgress, DemandStatus};
use crate::eligibility::EligibilityIndex;
use crate::models::{ClassroomType, SubjectType};

/// How the infeasibility was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfeasibilityCause {
    /// Fewer candidate slots than sessions, before any search.
    NoEligibleCandidates,
    /// The group's weekly load exceeds the grid.
    GroupOverloaded,
    /// Exhaustive search with an empty conflict set.
    SearchExhausted,
}

/// Resource dimension that blocks a demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dimension", rename_all = "snake_case")]
pub enum BlockedResource {
    Teacher {
        teacher_ids: Vec<String>,
    },
    Classroom {
        required_type: ClassroomType,
        classroom_ids: Vec<String>,
    },
    Slot {
        class_group_id: String,
    },
}

/// Suggested fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    AssignQualifiedTeacher,
    WidenTeacherAvailability,
    AddClassroom,
    ReduceGroupLoad,
    AdjustResources,
}

impl Recommendation {
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::AssignQualifiedTeacher => {
                "assign a teacher who teaches the subject and is assigned to the group"
            }
            Recommendation::WidenTeacherAvailability => "increase teacher availability",
            Recommendation::AddClassroom => "add a suitable classroom",
            Recommendation::ReduceGroupLoad => "reduce the group's weekly load",
            Recommendation::AdjustResources => "adjust teachers, classrooms or hours",
        }
    }
}

/// Counts behind a diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSummary {
    /// Grid slots examined.
    pub slots_checked: usize,
    /// Slots at which some qualified teacher is available.
    pub slots_with_teacher: usize,
    /// (qualified teacher, slot) pairs where the teacher is unavailable.
    pub teacher_unavailable: usize,
    /// Classrooms that fit the demand.
    pub suitable_classrooms: usize,
    /// Candidates pruned by teacher clashes during search.
    pub teacher_prunes: u64,
    /// Candidates pruned by classroom clashes during search.
    pub classroom_prunes: u64,
    /// Candidates pruned by group clashes during search.
    pub group_prunes: u64,
}

/// Why a demand cannot be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfeasibilityReport {
    pub class_group_id: String,
    pub subject_id: String,
    pub weekly_count: u32,
    /// Sessions placed when the failure was detected.
    pub placed: usize,
    pub cause: InfeasibilityCause,
    pub blocked: BlockedResource,
    pub summary: ConflictSummary,
    pub recommendation: Recommendation,
    /// State of every demand when the run stopped; the reported one is
    /// [`DemandStatus::Infeasible`].
    pub progress: Vec<DemandProgress>,
}

impl fmt::Display for InfeasibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot schedule {} for group {} ({}/{} weekly sessions): ",
            self.subject_id, self.class_group_id, self.placed, self.weekly_count
        )?;
        match self.cause {
            InfeasibilityCause::NoEligibleCandidates => write!(f, "not enough eligible slots")?,
            InfeasibilityCause::GroupOverloaded => write!(f, "group load exceeds the week")?,
            InfeasibilityCause::SearchExhausted => write!(f, "no arrangement exists")?,
        }
        match &self.blocked {
            BlockedResource::Teacher { teacher_ids } => {
                write!(f, "; blocked by teachers [{}]", teacher_ids.join(", "))?
            }
            BlockedResource::Classroom {
                required_type,
                classroom_ids,
            } => write!(
                f,
                "; blocked by {} classrooms [{}]",
                required_type.as_str(),
                classroom_ids.join(", ")
            )?,
            BlockedResource::Slot { class_group_id } => {
                write!(f, "; blocked by the slots of group {class_group_id}")?
            }
        }
        write!(f, "; {}", self.recommendation.message())
    }
}

/// Reports the first demand that fails a static check, if any.
pub(crate) fn static_check(
    ctx: &RuleContext<'_>,
    index: &EligibilityIndex,
) -> Option<InfeasibilityReport> {
    let cat = ctx.catalog;
    let slot_count = cat.grid().len();

    let mut load = vec![0usize; cat.group_count()];
    for demand in ctx.demands {
        load[demand.group] = load[demand.group].saturating_add(demand.weekly_count as usize);
    }
    for demand in ctx.demands {
        if load[demand.group] > slot_count {
            let mut report = diagnose(ctx, index, demand.index, &[], [0; 3]);
            report.cause = InfeasibilityCause::GroupOverloaded;
            report.blocked = BlockedResource::Slot {
                class_group_id: demand.class_group_id.clone(),
            };
            report.recommendation = Recommendation::ReduceGroupLoad;
            return Some(report);
        }
    }

    ctx.demands
        .iter()
        .find(|d| index.demand(d.index).slot_count() < d.weekly_count as usize)
        .map(|d| {
            let mut report = diagnose(ctx, index, d.index, &[], [0; 3]);
            report.cause = InfeasibilityCause::NoEligibleCandidates;
            report
        })
}

/// Builds the report for a demand that cannot be completed.
///
/// `placed` holds the sessions placed per demand (missing entries read as
/// zero); `blame` holds the search prunes by teacher, classroom and group.
pub(crate) fn diagnose(
    ctx: &RuleContext<'_>,
    index: &EligibilityIndex,
    demand: usize,
    placed: &[usize],
    blame: [u64; 3],
) -> InfeasibilityReport {
    let cat = ctx.catalog;
    let d = &ctx.demands[demand];
    let eligibility = index.demand(demand);
    let teachers = &eligibility.teachers;
    let slot_count = cat.grid().len();

    let slots_with_teacher = (0..slot_count)
        .filter(|&s| teachers.iter().any(|&t| cat.is_available(t, s)))
        .count();
    let teacher_unavailable = teachers
        .iter()
        .map(|&t| slot_count - cat.available_slot_count(t))
        .sum();
    let summary = ConflictSummary {
        slots_checked: slot_count,
        slots_with_teacher,
        teacher_unavailable,
        suitable_classrooms: eligibility.classrooms.len(),
        teacher_prunes: blame[0],
        classroom_prunes: blame[1],
        group_prunes: blame[2],
    };

    let teacher_ids = |ids: &[usize]| ids.iter().map(|&t| cat.teacher(t).id.clone()).collect();
    let (blocked, recommendation) = if teachers.is_empty() {
        (
            BlockedResource::Teacher {
                teacher_ids: cat.subject(d.subject).teacher_ids.clone(),
            },
            Recommendation::AssignQualifiedTeacher,
        )
    } else if slots_with_teacher == 0 || slots_with_teacher < d.weekly_count as usize {
        (
            BlockedResource::Teacher {
                teacher_ids: teacher_ids(teachers),
            },
            Recommendation::WidenTeacherAvailability,
        )
    } else if eligibility.classrooms.is_empty() {
        (
            classroom_block(cat, d.subject_type),
            Recommendation::AddClassroom,
        )
    } else if blame[0] > 0 && blame[0] >= blame[1] && blame[0] >= blame[2] {
        (
            BlockedResource::Teacher {
                teacher_ids: teacher_ids(teachers),
            },
            Recommendation::WidenTeacherAvailability,
        )
    } else if blame[1] > 0 && blame[1] >= blame[2] {
        (
            BlockedResource::Classroom {
                required_type: required_type(d.subject_type),
                classroom_ids: eligibility
                    .classrooms
                    .iter()
                    .map(|&r| cat.classroom(r).id.clone())
                    .collect(),
            },
            Recommendation::AddClassroom,
        )
    } else if blame[2] > 0 {
        (
            BlockedResource::Slot {
                class_group_id: d.class_group_id.clone(),
            },
            Recommendation::ReduceGroupLoad,
        )
    } else {
        (
            BlockedResource::Slot {
                class_group_id: d.class_group_id.clone(),
            },
            Recommendation::AdjustResources,
        )
    };

    let placed_of = |e: usize| placed.get(e).copied().unwrap_or(0);
    let progress = ctx
        .demands
        .iter()
        .map(|e| {
            let p = DemandProgress::new(e, placed_of(e.index));
            if e.index == demand {
                p.with_status(DemandStatus::Infeasible)
            } else {
                p
            }
        })
        .collect();

    InfeasibilityReport {
        class_group_id: d.class_group_id.clone(),
        subject_id: d.subject_id.clone(),
        weekly_count: d.weekly_count,
        placed: placed_of(demand),
        cause: InfeasibilityCause::SearchExhausted,
        blocked,
        summary,
        recommendation,
        progress,
    }
}

fn required_type(subject_type: SubjectType) -> ClassroomType {
    match subject_type {
        SubjectType::Lab => ClassroomType::Lab,
        SubjectType::Theory => ClassroomType::Theory,
    }
}

/// Rooms of the required type, the ones that were rejected.
fn classroom_block(cat: &Catalog<'_>, subject_type: SubjectType) -> BlockedResource {
    BlockedResource::Classroom {
        required_type: required_type(subject_type),
        classroom_ids: cat
            .snapshot()
            .classrooms
            .iter()
            .filter(|c| c.classroom_type.serves(subject_type))
            .map(|c| c.id.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{ConstraintModel, Pins};
    use crate::demand::{derive_demands, RoundingPolicy};
    use crate::models::Snapshot;
    use crate::testing;

    fn static_report(snap: &Snapshot) -> Option<InfeasibilityReport> {
        let cat = Catalog::new(snap).unwrap();
        let demands = derive_demands(&cat, RoundingPolicy::Nearest).unwrap();
        let pins = Pins::none(demands.len());
        let ctx = RuleContext::new(&cat, &demands, &pins);
        let index = EligibilityIndex::build(&ctx, &ConstraintModel::hard_only());
        static_check(&ctx, &index)
    }

    #[test]
    fn test_feasible_passes() {
        assert!(static_report(&testing::trivial_snapshot()).is_none());
    }

    #[test]
    fn test_unavailable_teacher() {
        let report = static_report(&testing::unavailable_teacher_snapshot()).unwrap();
        assert_eq!(report.cause, InfeasibilityCause::NoEligibleCandidates);
        assert_eq!(
            report.blocked,
            BlockedResource::Teacher {
                teacher_ids: vec!["T1".into()]
            }
        );
        assert_eq!(report.recommendation, Recommendation::WidenTeacherAvailability);
        assert_eq!(report.summary.slots_with_teacher, 0);
        assert_eq!(report.summary.teacher_unavailable, 25);
    }

    #[test]
    fn test_capacity_conflict() {
        let report = static_report(&testing::capacity_conflict_snapshot()).unwrap();
        assert_eq!(
            report.blocked,
            BlockedResource::Classroom {
                required_type: ClassroomType::Theory,
                classroom_ids: vec!["R1".into()]
            }
        );
        assert_eq!(report.recommendation, Recommendation::AddClassroom);
        assert_eq!(report.summary.suitable_classrooms, 0);
        assert!(report.to_string().contains("blocked by theory classrooms [R1]"));
    }

    #[test]
    fn test_no_qualified_teacher() {
        let mut snap = testing::trivial_snapshot();
        snap.teachers[0].assigned_class_groups.clear();
        let report = static_report(&snap).unwrap();
        assert_eq!(report.recommendation, Recommendation::AssignQualifiedTeacher);
        assert_eq!(
            report.blocked,
            BlockedResource::Teacher {
                teacher_ids: vec!["T1".into()]
            }
        );
    }

    #[test]
    fn test_group_overloaded() {
        // 26 weekly sessions on a 25-slot grid
        let mut heavy = testing::trivial_snapshot();
        heavy.class_groups[0]
            .subject_hours
            .insert("MATH".into(), 26 * 40);
        let report = static_report(&heavy).unwrap();
        assert_eq!(report.cause, InfeasibilityCause::GroupOverloaded);
        assert_eq!(report.recommendation, Recommendation::ReduceGroupLoad);
    }

    #[test]
    fn test_search_blame_picks_dimension() {
        let snap = testing::trivial_snapshot();
        let cat = Catalog::new(&snap).unwrap();
        let demands = derive_demands(&cat, RoundingPolicy::Nearest).unwrap();
        let pins = Pins::none(demands.len());
        let ctx = RuleContext::new(&cat, &demands, &pins);
        let index = EligibilityIndex::build(&ctx, &ConstraintModel::hard_only());

        let by_room = diagnose(&ctx, &index, 0, &[1], [1, 5, 2]);
        assert_eq!(by_room.recommendation, Recommendation::AddClassroom);
        assert_eq!(by_room.placed, 1);
        assert_eq!(by_room.cause, InfeasibilityCause::SearchExhausted);

        let by_teacher = diagnose(&ctx, &index, 0, &[], [4, 4, 0]);
        assert_eq!(by_teacher.recommendation, Recommendation::WidenTeacherAvailability);

        let by_group = diagnose(&ctx, &index, 0, &[], [0, 0, 3]);
        assert_eq!(
            by_group.blocked,
            BlockedResource::Slot {
                class_group_id: "G1".into()
            }
        );
    }

    #[test]
    fn test_progress_marks_blocked_demand() {
        let snap = testing::lab_snapshot();
        let cat = Catalog::new(&snap).unwrap();
        let demands = derive_demands(&cat, RoundingPolicy::Nearest).unwrap();
        let pins = Pins::none(demands.len());
        let ctx = RuleContext::new(&cat, &demands, &pins);
        let index = EligibilityIndex::build(&ctx, &ConstraintModel::hard_only());

        // BIO placed, CHEM stuck, MATH untouched
        let report = diagnose(&ctx, &index, 1, &[1, 0], [0, 0, 1]);
        let statuses: Vec<(&str, DemandStatus)> = report
            .progress
            .iter()
            .map(|p| (p.subject_id.as_str(), p.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("BIO", DemandStatus::FullyPlaced),
                ("CHEM", DemandStatus::Infeasible),
                ("MATH", DemandStatus::Unplaced),
            ]
        );
    }
}
