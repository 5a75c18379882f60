//! Built-in dispatching rules.
//!
//! # Categories
//!
//! - **Constraint-based**: SCARCITY, FEWEST_TEACHERS
//! - **Load-based**: MOST_SESSIONS, MOST_REMAINING, LARGEST_GROUP
//! - **Type-based**: LAB_FIRST
//!
//! # Score Convention
//! All rules return lower scores for higher priority demands.

use super::{DispatchingRule, OrderingContext, RuleScore};
use crate::demand::Demand;

/// Fewest live candidates first (fail-first).
///
/// # Reference
/// Haralick & Elliott (1980), minimum remaining values.
#[derive(Debug, Clone, Copy)]
pub struct Scarcity;

impl DispatchingRule for Scarcity {
    fn name(&self) -> &'static str {
        "SCARCITY"
    }

    fn evaluate(&self, demand: &Demand, context: &OrderingContext<'_>) -> RuleScore {
        context.live(demand.index) as f64
    }

    fn description(&self) -> &'static str {
        "Fewest Live Candidates"
    }
}

/// Largest weekly session count first.
#[derive(Debug, Clone, Copy)]
pub struct MostSessions;

impl DispatchingRule for MostSessions {
    fn name(&self) -> &'static str {
        "MOST_SESSIONS"
    }

    fn evaluate(&self, demand: &Demand, _context: &OrderingContext<'_>) -> RuleScore {
        -(demand.weekly_count as f64)
    }

    fn description(&self) -> &'static str {
        "Most Weekly Sessions"
    }
}

/// Most sessions still to place first.
#[derive(Debug, Clone, Copy)]
pub struct MostRemaining;

impl DispatchingRule for MostRemaining {
    fn name(&self) -> &'static str {
        "MOST_REMAINING"
    }

    fn evaluate(&self, demand: &Demand, context: &OrderingContext<'_>) -> RuleScore {
        -(context.remaining_of(demand.index) as f64)
    }

    fn description(&self) -> &'static str {
        "Most Sessions Remaining"
    }
}

/// Lab demands before theory demands.
///
/// Labs compete for fewer rooms.
#[derive(Debug, Clone, Copy)]
pub struct LabFirst;

impl DispatchingRule for LabFirst {
    fn name(&self) -> &'static str {
        "LAB_FIRST"
    }

    fn evaluate(&self, demand: &Demand, _context: &OrderingContext<'_>) -> RuleScore {
        if demand.is_lab() {
            0.0
        } else {
            1.0
        }
    }

    fn description(&self) -> &'static str {
        "Labs Before Theory"
    }
}

/// Fewest qualified teachers first.
#[derive(Debug, Clone, Copy)]
pub struct FewestTeachers;

impl DispatchingRule for FewestTeachers {
    fn name(&self) -> &'static str {
        "FEWEST_TEACHERS"
    }

    fn evaluate(&self, demand: &Demand, context: &OrderingContext<'_>) -> RuleScore {
        context.teachers_of(demand.index) as f64
    }

    fn description(&self) -> &'static str {
        "Fewest Qualified Teachers"
    }
}

/// Largest group first. Large groups fit fewer rooms.
#[derive(Debug, Clone, Copy)]
pub struct LargestGroup;

impl DispatchingRule for LargestGroup {
    fn name(&self) -> &'static str {
        "LARGEST_GROUP"
    }

    fn evaluate(&self, demand: &Demand, _context: &OrderingContext<'_>) -> RuleScore {
        -(demand.students as f64)
    }

    fn description(&self) -> &'static str {
        "Largest Group"
    }
}
