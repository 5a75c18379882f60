//! Hard rules.
//!
//! Each rule has two faces: [`HardRule::admits`] tests one placement
//! against the live busy tables during search, and [`HardRule::audit`]
//! checks a finished timetable from scratch.

use std::collections::BTreeMap;

use super::{Ledger, Placement, ResolvedSlot, RuleContext};
use crate::models::{ConstraintViolation, ViolationKind};

/// A rule no timetable may break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardRule {
    TeacherClash,
    ClassroomClash,
    GroupClash,
    TeacherAvailability,
    RoomSuitability,
    TeacherQualification,
    SessionCount,
}

impl HardRule {
    /// Every hard rule, cheapest first.
    pub const ALL: [HardRule; 7] = [
        HardRule::GroupClash,
        HardRule::TeacherClash,
        HardRule::ClassroomClash,
        HardRule::SessionCount,
        HardRule::TeacherAvailability,
        HardRule::TeacherQualification,
        HardRule::RoomSuitability,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HardRule::TeacherClash => "teacher_clash",
            HardRule::ClassroomClash => "classroom_clash",
            HardRule::GroupClash => "group_clash",
            HardRule::TeacherAvailability => "teacher_availability",
            HardRule::RoomSuitability => "room_suitability",
            HardRule::TeacherQualification => "teacher_qualification",
            HardRule::SessionCount => "session_count",
        }
    }

    /// Whether the rule admits `p`.
    ///
    /// Without a ledger the placement is judged against an empty timetable,
    /// so the clash and count rules always admit.
    pub fn admits(&self, ctx: &RuleContext<'_>, ledger: Option<&Ledger>, p: &Placement) -> bool {
        let demand = &ctx.demands[p.demand];
        match self {
            HardRule::TeacherClash => ledger.map_or(true, |l| l.teacher_free(p.teacher, p.slot)),
            HardRule::ClassroomClash => {
                ledger.map_or(true, |l| l.classroom_free(p.classroom, p.slot))
            }
            HardRule::GroupClash => ledger.map_or(true, |l| l.group_free(demand.group, p.slot)),
            HardRule::TeacherAvailability => ctx.catalog.is_available(p.teacher, p.slot),
            HardRule::RoomSuitability => ctx
                .catalog
                .room_fit(demand.subject, demand.group, p.classroom, Some(p.teacher))
                .is_suitable(),
            HardRule::TeacherQualification => {
                ctx.catalog
                    .is_qualified(p.teacher, demand.subject, demand.group)
            }
            HardRule::SessionCount => {
                ledger.map_or(true, |l| l.placed(p.demand) < demand.weekly_count as usize)
            }
        }
    }

    /// Every violation of the rule in a resolved timetable.
    pub fn audit(&self, ctx: &RuleContext<'_>, slots: &[ResolvedSlot]) -> Vec<ConstraintViolation> {
        let cat = ctx.catalog;
        let grid = cat.grid();
        let when = |slot: usize| {
            let s = grid.slot(slot);
            format!("{} lesson {}", grid.day_name(s.day_index), s.lesson_number)
        };

        match self {
            HardRule::TeacherClash => clashes(slots, |r| r.teacher)
                .map(|((t, slot), positions)| {
                    let id = &cat.teacher(t).id;
                    ConstraintViolation::new(
                        ViolationKind::TeacherClash,
                        id,
                        positions,
                        format!("Teacher '{}' is double-booked on {}", id, when(slot)),
                    )
                })
                .collect(),
            HardRule::ClassroomClash => clashes(slots, |r| r.classroom)
                .map(|((c, slot), positions)| {
                    let id = &cat.classroom(c).id;
                    ConstraintViolation::new(
                        ViolationKind::ClassroomClash,
                        id,
                        positions,
                        format!("Classroom '{}' is double-booked on {}", id, when(slot)),
                    )
                })
                .collect(),
            HardRule::GroupClash => clashes(slots, |r| r.group)
                .map(|((g, slot), positions)| {
                    let id = &cat.group(g).id;
                    ConstraintViolation::new(
                        ViolationKind::GroupClash,
                        id,
                        positions,
                        format!("Group '{}' has two sessions on {}", id, when(slot)),
                    )
                })
                .collect(),
            HardRule::TeacherAvailability => slots
                .iter()
                .filter(|r| !cat.is_available(r.teacher, r.slot))
                .map(|r| {
                    let id = &cat.teacher(r.teacher).id;
                    ConstraintViolation::new(
                        ViolationKind::TeacherUnavailable,
                        id,
                        vec![r.position],
                        format!("Teacher '{}' is not available on {}", id, when(r.slot)),
                    )
                })
                .collect(),
            HardRule::RoomSuitability => slots
                .iter()
                .filter_map(|r| {
                    let fit = cat.room_fit(r.subject, r.group, r.classroom, Some(r.teacher));
                    (!fit.is_suitable()).then(|| {
                        let id = &cat.classroom(r.classroom).id;
                        ConstraintViolation::new(
                            ViolationKind::RoomMismatch,
                            id,
                            vec![r.position],
                            format!(
                                "Classroom '{}' cannot host {} for group '{}': {}",
                                id,
                                cat.subject(r.subject).id,
                                cat.group(r.group).id,
                                fit.reason()
                            ),
                        )
                    })
                })
                .collect(),
            HardRule::TeacherQualification => slots
                .iter()
                .filter(|r| !cat.is_qualified(r.teacher, r.subject, r.group))
                .map(|r| {
                    let id = &cat.teacher(r.teacher).id;
                    ConstraintViolation::new(
                        ViolationKind::TeacherNotQualified,
                        id,
                        vec![r.position],
                        format!(
                            "Teacher '{}' may not teach {} to group '{}'",
                            id,
                            cat.subject(r.subject).id,
                            cat.group(r.group).id
                        ),
                    )
                })
                .collect(),
            HardRule::SessionCount => session_counts(ctx, slots),
        }
    }
}

/// (resource, slot) keys used more than once, with the positions involved.
fn clashes(
    slots: &[ResolvedSlot],
    resource: impl Fn(&ResolvedSlot) -> usize,
) -> impl Iterator<Item = ((usize, usize), Vec<usize>)> {
    let mut seen: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for r in slots {
        seen.entry((resource(r), r.slot)).or_default().push(r.position);
    }
    seen.into_iter().filter(|(_, positions)| positions.len() > 1)
}

fn session_counts(ctx: &RuleContext<'_>, slots: &[ResolvedSlot]) -> Vec<ConstraintViolation> {
    let mut by_demand: Vec<Vec<usize>> = vec![Vec::new(); ctx.demands.len()];
    let mut violations = Vec::new();

    for r in slots {
        match r.demand {
            Some(d) => by_demand[d].push(r.position),
            None => {
                let group = &ctx.catalog.group(r.group).id;
                violations.push(ConstraintViolation::new(
                    ViolationKind::SessionCountMismatch,
                    group,
                    vec![r.position],
                    format!(
                        "Group '{}' has no required hours of {}",
                        group,
                        ctx.catalog.subject(r.subject).id
                    ),
                ));
            }
        }
    }

    for (demand, positions) in ctx.demands.iter().zip(by_demand) {
        if positions.len() != demand.weekly_count as usize {
            violations.push(ConstraintViolation::new(
                ViolationKind::SessionCountMismatch,
                &demand.class_group_id,
                positions.clone(),
                format!(
                    "Group '{}' has {} weekly sessions of {}, expected {}",
                    demand.class_group_id,
                    positions.len(),
                    demand.subject_id,
                    demand.weekly_count
                ),
            ));
        }
    }
    violations
}
