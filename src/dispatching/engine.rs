//! Lexicographic rule engine for demand ordering.
//!
//! Rules are compared in insertion order: a later rule only decides
//! between two demands whose earlier scores all tie (within `epsilon`).
//! Whatever is still tied is settled by the [`TieBreaker`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::{rules, DispatchingRule, OrderingContext, RuleScore};
use crate::demand::Demand;

/// How demands tied on every rule are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreaker {
    /// Keep input order.
    #[default]
    NextRule,
    /// Lower demand index first.
    ById,
}

/// An ordered list of dispatching rules.
///
/// # Example
/// ```
/// use u_timetable::dispatching::{rules, RuleEngine, TieBreaker};
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::Scarcity)
///     .with_tie_breaker(rules::LargestGroup)
///     .with_final_tie_breaker(TieBreaker::ById);
/// assert_eq!(engine.rule_names(), vec!["SCARCITY", "LARGEST_GROUP"]);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    chain: Vec<Arc<dyn DispatchingRule>>,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an engine without rules; every demand ties.
    pub fn new() -> Self {
        Self {
            chain: Vec::new(),
            tie_breaker: TieBreaker::NextRule,
            epsilon: 1e-9,
        }
    }

    /// Most-constrained-first ordering used by the generator.
    ///
    /// Fewest live candidates, then most weekly sessions, then labs before
    /// theory, then demand index.
    pub fn most_constrained() -> Self {
        Self::new()
            .with_rule(rules::Scarcity)
            .with_tie_breaker(rules::MostSessions)
            .with_tie_breaker(rules::LabFirst)
            .with_final_tie_breaker(TieBreaker::ById)
    }

    /// Appends the primary rule.
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.chain.push(Arc::new(rule));
        self
    }

    /// Appends a rule consulted only when every earlier rule ties.
    pub fn with_tie_breaker<R: DispatchingRule + 'static>(self, rule: R) -> Self {
        self.with_rule(rule)
    }

    /// Sets how fully tied demands are ordered.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Sets the score difference below which two scores tie.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon.abs();
        self
    }

    /// Whether the engine has no rules.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Rule names in consultation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|r| r.name()).collect()
    }

    /// Compares two demands; `Less` means `a` is placed first.
    pub fn compare(&self, a: &Demand, b: &Demand, context: &OrderingContext<'_>) -> Ordering {
        self.chain
            .iter()
            .map(|rule| (rule.evaluate(a, context), rule.evaluate(b, context)))
            .find(|(x, y)| (x - y).abs() > self.epsilon)
            .and_then(|(x, y)| x.partial_cmp(&y))
            .unwrap_or_else(|| match self.tie_breaker {
                TieBreaker::NextRule => Ordering::Equal,
                TieBreaker::ById => a.index.cmp(&b.index),
            })
    }

    /// Positions into `demands`, highest priority first.
    pub fn sort_indices(&self, demands: &[&Demand], context: &OrderingContext<'_>) -> Vec<usize> {
        let mut order: Vec<usize> = (0..demands.len()).collect();
        order.sort_by(|&a, &b| self.compare(demands[a], demands[b], context));
        order
    }

    /// Position of the highest-priority demand, in one pass.
    ///
    /// The first of several equally ranked demands wins.
    pub fn select_best(&self, demands: &[&Demand], context: &OrderingContext<'_>) -> Option<usize> {
        let mut best: Option<usize> = None;
        for i in 0..demands.len() {
            match best {
                Some(b) if self.compare(demands[i], demands[b], context) != Ordering::Less => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// Raw score of every rule for one demand.
    pub fn scores(&self, demand: &Demand, context: &OrderingContext<'_>) -> Vec<RuleScore> {
        self.chain
            .iter()
            .map(|rule| rule.evaluate(demand, context))
            .collect()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::most_constrained()
    }
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_names())
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}
