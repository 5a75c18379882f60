//! Demand ordering rules and rule engine.
//!
//! The solver picks the next demand to place dynamically: at every
//! decision the [`RuleEngine`] ranks the unfinished demands against the
//! live search state in an [`OrderingContext`].
//!
//! # Usage
//!
//! ```
//! use u_timetable::dispatching::{RuleEngine, TieBreaker};
//! use u_timetable::dispatching::rules;
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::Scarcity)
//!     .with_tie_breaker(rules::MostSessions)
//!     .with_final_tie_breaker(TieBreaker::ById);
//! ```
//!
//! # References
//!
//! - Brélaz (1979), "New Methods to Color the Vertices of a Graph"
//! - Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//!   Constraint Satisfaction Problems" (fail-first)

mod context;
mod engine;
pub mod rules;

pub use context::OrderingContext;
pub use engine::{RuleEngine, TieBreaker};

use crate::demand::Demand;
use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (placed first).
pub type RuleScore = f64;

/// A rule that ranks demands for placement.
///
/// # Score Convention
/// **Lower score = higher priority.**
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "SCARCITY").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of a demand in the current search state.
    fn evaluate(&self, demand: &Demand, context: &OrderingContext<'_>) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
