//! Soft rules.
//!
//! A soft rule returns an unweighted penalty over a [`Focus`]: the
//! demands, groups and teachers whose state a change can affect. Scoring
//! only the focus keeps marginal evaluation cheap during search and swaps;
//! [`Focus::full`] scores the whole timetable.
//!
//! # Penalties
//!
//! | Rule | Unit |
//! |------|------|
//! | MaxSameSubjectPerDay | session above the daily limit |
//! | PreferConsecutiveLessons | gap between same-subject sessions of a day |
//! | BalanceWeeklyLoad | `n * sum(x^2) - (sum x)^2` over daily loads |
//! | PreserveLabSchedule | pinned lab slot not used |
//! | PreferHomeClassroom | session outside an available preferred room |

use std::collections::BTreeSet;

use super::{Ledger, Placement, RuleContext};

/// Region of the timetable a change touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Focus {
    pub demands: BTreeSet<usize>,
    pub groups: BTreeSet<usize>,
    pub teachers: BTreeSet<usize>,
}

impl Focus {
    /// Every demand, group and teacher.
    pub fn full(ctx: &RuleContext<'_>) -> Self {
        Self {
            demands: (0..ctx.demands.len()).collect(),
            groups: (0..ctx.catalog.group_count()).collect(),
            teachers: (0..ctx.catalog.teacher_count()).collect(),
        }
    }

    /// The region touched by adding or moving the given placements.
    pub fn for_placements<'p>(
        ctx: &RuleContext<'_>,
        placements: impl IntoIterator<Item = &'p Placement>,
    ) -> Self {
        let mut focus = Self::default();
        for p in placements {
            focus.demands.insert(p.demand);
            focus.groups.insert(ctx.demands[p.demand].group);
            focus.teachers.insert(p.teacher);
        }
        focus
    }
}

/// A weighted preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftRule {
    /// At most `limit` sessions of a subject per group per day.
    MaxSameSubjectPerDay { limit: u32 },
    /// Same-subject sessions of a day should be back to back.
    PreferConsecutiveLessons,
    /// Daily loads of groups and teachers should be even.
    BalanceWeeklyLoad,
    /// Lab sessions should stay where the previous schedule had them.
    PreserveLabSchedule,
    /// Sessions should use the group's home room or the teacher's own lab.
    PreferHomeClassroom,
}

impl SoftRule {
    pub fn name(&self) -> &'static str {
        match self {
            SoftRule::MaxSameSubjectPerDay { .. } => "max_same_subject_per_day",
            SoftRule::PreferConsecutiveLessons => "prefer_consecutive_lessons",
            SoftRule::BalanceWeeklyLoad => "balance_weekly_load",
            SoftRule::PreserveLabSchedule => "preserve_lab_schedule",
            SoftRule::PreferHomeClassroom => "prefer_home_classroom",
        }
    }

    /// Unweighted penalty of the focus region.
    pub fn penalty(&self, ctx: &RuleContext<'_>, ledger: &Ledger, focus: &Focus) -> i64 {
        match self {
            SoftRule::MaxSameSubjectPerDay { limit } => focus
                .demands
                .iter()
                .flat_map(|&d| ledger.demand_days(d))
                .map(|&n| i64::from(n.saturating_sub(*limit)))
                .sum(),
            SoftRule::PreferConsecutiveLessons => focus
                .demands
                .iter()
                .map(|&d| gaps(ledger, ledger.placements_of(d)))
                .sum(),
            SoftRule::BalanceWeeklyLoad => {
                let groups: i64 = focus
                    .groups
                    .iter()
                    .map(|&g| imbalance(ledger.group_days(g)))
                    .sum();
                let teachers: i64 = focus
                    .teachers
                    .iter()
                    .map(|&t| imbalance(ledger.teacher_days(t)))
                    .sum();
                groups + teachers
            }
            SoftRule::PreserveLabSchedule => focus
                .demands
                .iter()
                .map(|&d| {
                    let placed = ledger.placements_of(d);
                    ctx.pins
                        .of(d)
                        .iter()
                        .filter(|&&slot| !placed.iter().any(|p| p.slot == slot))
                        .count() as i64
                })
                .sum(),
            SoftRule::PreferHomeClassroom => focus
                .demands
                .iter()
                .flat_map(|&d| ledger.placements_of(d))
                .filter(|p| {
                    let demand = &ctx.demands[p.demand];
                    let preferred = ctx
                        .catalog
                        .preferred_rooms(demand.group, demand.subject, p.teacher);
                    !preferred.is_empty() && !preferred.contains(&p.classroom)
                })
                .count() as i64,
        }
    }
}

/// Non-adjacent neighbours among same-day sessions of one demand.
fn gaps(ledger: &Ledger, placements: &[Placement]) -> i64 {
    let mut slots: Vec<usize> = placements.iter().map(|p| p.slot).collect();
    slots.sort_unstable();
    slots
        .windows(2)
        .filter(|w| ledger.day_of(w[0]) == ledger.day_of(w[1]) && w[1] - w[0] > 1)
        .count() as i64
}

/// `n * sum(x^2) - (sum x)^2`, i.e. `n^2` times the variance.
fn imbalance(days: &[u32]) -> i64 {
    let n = days.len() as i64;
    let sum: i64 = days.iter().map(|&x| i64::from(x)).sum();
    let squares: i64 = days.iter().map(|&x| i64::from(x) * i64::from(x)).sum();
    n * squares - sum * sum
}
