//! Constraint model.
//!
//! Hard rules decide whether a placement is admissible; soft rules score
//! a (partial) timetable. Both are tagged enums evaluated outside the
//! search loop, so the solver never hard-codes a rule.
//!
//! # Hard Rules
//!
//! | Rule | Admits | Audits |
//! |------|--------|--------|
//! | TeacherClash | teacher free at slot | teacher booked once per slot |
//! | ClassroomClash | room free at slot | room booked once per slot |
//! | GroupClash | group free at slot | group booked once per slot |
//! | TeacherAvailability | teacher available | same |
//! | RoomSuitability | type, specialization, capacity, ownership | same |
//! | TeacherQualification | listed, teaches, assigned | same |
//! | SessionCount | demand below weekly count | exactly weekly count |
//!
//! # Soft Rules
//! See [`SoftRule`]. Each rule carries a weight from
//! [`PenaltyWeights`]; the model's penalty is the weighted sum.

mod hard;
mod ledger;
mod soft;

pub use hard::HardRule;
pub use ledger::{Ledger, Placement};
pub use soft::{Focus, SoftRule};

use std::collections::{BTreeSet, HashMap};

use crate::catalog::Catalog;
use crate::config::{GenerationConstraints, PenaltyWeights};
use crate::demand::Demand;
use crate::models::ScheduleSlot;

/// Lab slots carried over from a previous schedule, per demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pins {
    by_demand: Vec<BTreeSet<usize>>,
}

impl Pins {
    /// No pins for `demand_count` demands.
    pub fn none(demand_count: usize) -> Self {
        Self {
            by_demand: vec![BTreeSet::new(); demand_count],
        }
    }

    /// Collects the lab sessions of a previous schedule.
    ///
    /// Entries that no longer match a lab demand or a grid slot are
    /// ignored; a previous schedule is a preference, not an input contract.
    pub fn from_previous(
        catalog: &Catalog<'_>,
        demands: &[Demand],
        previous: &[ScheduleSlot],
    ) -> Self {
        let mut pins = Self::none(demands.len());
        let lookup = demand_lookup(demands);
        for entry in previous {
            let demand = catalog
                .group_index(&entry.class_group_id)
                .zip(catalog.subject_index(&entry.subject_id))
                .and_then(|key| lookup.get(&key).copied());
            let Some(d) = demand.filter(|&d| demands[d].is_lab()) else {
                continue;
            };
            if let Some(slot) = catalog.grid().locate(&entry.day, entry.lesson_number) {
                pins.by_demand[d].insert(slot);
            }
        }
        pins
    }

    /// Pinned slots of a demand.
    pub fn of(&self, demand: usize) -> &BTreeSet<usize> {
        &self.by_demand[demand]
    }

    /// Total pinned slots.
    pub fn len(&self) -> usize {
        self.by_demand.iter().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only data every rule evaluates against.
#[derive(Debug)]
pub struct RuleContext<'a> {
    pub catalog: &'a Catalog<'a>,
    pub demands: &'a [Demand],
    pub pins: &'a Pins,
    lookup: HashMap<(usize, usize), usize>,
}

impl<'a> RuleContext<'a> {
    pub fn new(catalog: &'a Catalog<'a>, demands: &'a [Demand], pins: &'a Pins) -> Self {
        Self {
            catalog,
            demands,
            pins,
            lookup: demand_lookup(demands),
        }
    }

    /// Demand of a (group, subject) pair.
    pub fn demand_of(&self, group: usize, subject: usize) -> Option<usize> {
        self.lookup.get(&(group, subject)).copied()
    }
}

fn demand_lookup(demands: &[Demand]) -> HashMap<(usize, usize), usize> {
    demands
        .iter()
        .map(|d| ((d.group, d.subject), d.index))
        .collect()
}

/// A schedule entry resolved to catalog indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlot {
    /// Position in the audited list.
    pub position: usize,
    pub slot: usize,
    pub group: usize,
    pub subject: usize,
    pub teacher: usize,
    pub classroom: usize,
    /// Demand matching (group, subject), if the group requires the subject.
    pub demand: Option<usize>,
}

/// The active hard rules and weighted soft rules of a run.
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    hard: Vec<HardRule>,
    soft: Vec<(SoftRule, i64)>,
}

impl ConstraintModel {
    /// Builds the model from request switches and weights.
    ///
    /// Every hard rule is always active. A soft rule is active when its
    /// switch is on and its weight is positive.
    pub fn new(constraints: &GenerationConstraints, weights: &PenaltyWeights) -> Self {
        let mut soft = Vec::new();
        if constraints.max_same_subject_per_day > 0 && weights.same_subject_excess > 0 {
            soft.push((
                SoftRule::MaxSameSubjectPerDay {
                    limit: constraints.max_same_subject_per_day,
                },
                weights.same_subject_excess,
            ));
        }
        if constraints.prefer_consecutive_lessons && weights.non_consecutive > 0 {
            soft.push((SoftRule::PreferConsecutiveLessons, weights.non_consecutive));
        }
        if constraints.balance_weekly_load && weights.load_imbalance > 0 {
            soft.push((SoftRule::BalanceWeeklyLoad, weights.load_imbalance));
        }
        if constraints.preserve_lab_schedule && weights.moved_lab > 0 {
            soft.push((SoftRule::PreserveLabSchedule, weights.moved_lab));
        }
        if weights.non_preferred_room > 0 {
            soft.push((SoftRule::PreferHomeClassroom, weights.non_preferred_room));
        }
        Self {
            hard: HardRule::ALL.to_vec(),
            soft,
        }
    }

    /// Hard rules only.
    pub fn hard_only() -> Self {
        Self {
            hard: HardRule::ALL.to_vec(),
            soft: Vec::new(),
        }
    }

    pub fn hard_rules(&self) -> &[HardRule] {
        &self.hard
    }

    pub fn soft_rules(&self) -> &[(SoftRule, i64)] {
        &self.soft
    }

    /// Whether every hard rule admits the placement.
    pub fn admits(&self, ctx: &RuleContext<'_>, ledger: Option<&Ledger>, p: &Placement) -> bool {
        self.hard.iter().all(|rule| rule.admits(ctx, ledger, p))
    }

    /// Weighted soft penalty over a focus region.
    pub fn penalty(&self, ctx: &RuleContext<'_>, ledger: &Ledger, focus: &Focus) -> i64 {
        self.soft
            .iter()
            .map(|(rule, weight)| weight * rule.penalty(ctx, ledger, focus))
            .sum()
    }

    /// Weighted soft penalty of the whole ledger.
    pub fn total_penalty(&self, ctx: &RuleContext<'_>, ledger: &Ledger) -> i64 {
        self.penalty(ctx, ledger, &Focus::full(ctx))
    }
}
