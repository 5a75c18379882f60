//! Timetable generation.
//!
//! [`TimetableGenerator`] turns a [`Snapshot`] into a weekly timetable in
//! two phases:
//!
//! 1. **Search**: forward checking with conflict-directed backjumping over
//!    the eligibility index, most constrained demand first. Proves
//!    infeasibility when the search space is exhausted.
//! 2. **Optimization**: slot swaps that lower the soft penalty while
//!    keeping every hard rule satisfied.
//!
//! The result is audited against every hard rule before it is returned.
//! A run is a pure function of the snapshot, the request and the engine
//! configuration: the same inputs give the same timetable.
//!
//! # Cancellation
//! A [`CancellationToken`] can be cloned and triggered from another
//! thread. The run checks it between decisions and returns
//! [`GenerationError::Cancelled`]. A triggered token stays triggered.
//!
//! # References
//!
//! - Prosser (1993), "Hybrid Algorithms for the Constraint Satisfaction Problem"
//! - Schaerf (1999), "A Survey of Automated Timetabling"

mod diagnosis;
mod domain;
mod kpi;
mod optimize;
mod search;

pub use diagnosis::{
    BlockedResource, ConflictSummary, InfeasibilityCause, InfeasibilityReport, Recommendation,
};
pub use kpi::{ScheduleKpi, UNEVEN_SPREAD};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::assembler::assemble;
use crate::catalog::Catalog;
use crate::config::{EngineConfig, GenerationConstraints};
use crate::constraints::{ConstraintModel, Pins, RuleContext};
use crate::demand::derive_demands;
use crate::dispatching::RuleEngine;
use crate::eligibility::EligibilityIndex;
use crate::error::GenerationError;
use crate::models::{ScheduleSlot, Snapshot};
use crate::validation::validate;

use search::{Search, SearchFailure};

/// Cooperative cancellation flag shared between threads.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Counters of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Commits attempted.
    pub decisions: u64,
    /// Commits undone.
    pub backtracks: u64,
    /// Jumps over more than one choice point.
    pub backjumps: u64,
    /// Candidates pruned by forward checking.
    pub pruned: u64,
    /// Improving swaps kept by the optimization pass.
    pub swaps: u64,
    /// Optimization rounds run.
    pub rounds: u64,
    /// Weighted soft penalty of the returned timetable.
    pub soft_penalty: i64,
}

/// A timetable with the run's counters and quality metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub slots: Vec<ScheduleSlot>,
    pub stats: SearchStats,
    pub kpi: ScheduleKpi,
}

/// Timetable generator.
///
/// # Example
/// ```
/// use u_timetable::config::GenerationConstraints;
/// use u_timetable::models::{ClassGroup, Classroom, Institution, Snapshot, Subject, Teacher};
/// use u_timetable::scheduler::TimetableGenerator;
///
/// let institution = Institution::new("College");
/// let days = institution.working_days.clone();
/// let snapshot = Snapshot::new(institution)
///     .with_subject(Subject::theory("MATH", "Mathematics").with_teacher("T1"))
///     .with_group(ClassGroup::new("G1").with_subject_hours("MATH", 80))
///     .with_classroom(Classroom::theory("R1"))
///     .with_teacher(
///         Teacher::new("T1")
///             .with_subject("Mathematics")
///             .with_group("G1")
///             .available_all(days, 4),
///     );
///
/// let slots = TimetableGenerator::new()
///     .generate(&snapshot, &GenerationConstraints::default(), &[])
///     .unwrap();
/// assert_eq!(slots.len(), 2);
/// ```
#[derive(Clone)]
pub struct TimetableGenerator {
    config: EngineConfig,
    engine: RuleEngine,
    cancel: CancellationToken,
}

impl TimetableGenerator {
    /// Creates a generator with the default configuration and the
    /// most-constrained-first ordering.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            engine: RuleEngine::most_constrained(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the demand ordering.
    pub fn with_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that cancels runs of this generator.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generates a timetable.
    ///
    /// `previous` is the last published timetable, if any; with
    /// `preserve_lab_schedule` its lab sessions are kept where possible.
    ///
    /// # Errors
    /// See [`GenerationError`].
    pub fn generate(
        &self,
        snapshot: &Snapshot,
        constraints: &GenerationConstraints,
        previous: &[ScheduleSlot],
    ) -> Result<Vec<ScheduleSlot>, GenerationError> {
        self.generate_report(snapshot, constraints, previous)
            .map(|report| report.slots)
    }

    /// Generates a timetable with run counters and KPIs.
    pub fn generate_report(
        &self,
        snapshot: &Snapshot,
        constraints: &GenerationConstraints,
        previous: &[ScheduleSlot],
    ) -> Result<GenerationReport, GenerationError> {
        self.config.validate()?;
        let started = Instant::now();

        let catalog = Catalog::new(snapshot)?;
        let demands = derive_demands(&catalog, snapshot.institution.hours_rounding)?;
        let required: usize = demands.iter().map(|d| d.weekly_count as usize).sum();
        info!(
            event = "generation_start",
            institution = %snapshot.institution.name,
            groups = catalog.group_count(),
            teachers = catalog.teacher_count(),
            classrooms = catalog.classroom_count(),
            slots = catalog.grid().len(),
        );
        info!(event = "demands_derived", demands = demands.len(), sessions = required);

        let pins = if constraints.preserve_lab_schedule {
            Pins::from_previous(&catalog, &demands, previous)
        } else {
            Pins::none(demands.len())
        };
        let model = ConstraintModel::new(constraints, &self.config.weights);
        let ctx = RuleContext::new(&catalog, &demands, &pins);
        let index = EligibilityIndex::build(&ctx, &model);

        if let Some(report) = diagnosis::static_check(&ctx, &index) {
            warn!(
                event = "infeasible",
                group = %report.class_group_id,
                subject = %report.subject_id,
                cause = ?report.cause,
            );
            return Err(GenerationError::Infeasible(Box::new(report)));
        }

        info!(event = "phase_start", phase = "Search", phase_index = 0);
        let phase_started = Instant::now();
        let mut search = Search::new(
            &ctx,
            &model,
            &index,
            &self.engine,
            &self.cancel,
            self.config.max_backtracks,
        );
        let outcome = search.run();
        let mut stats = search.stats().clone();
        info!(
            event = "phase_end",
            phase = "Search",
            phase_index = 0,
            duration_ms = phase_started.elapsed().as_millis() as u64,
            steps = stats.decisions,
            backtracks = stats.backtracks,
            backjumps = stats.backjumps,
            pruned = stats.pruned,
        );

        if let Err(failure) = outcome {
            return Err(match failure {
                SearchFailure::Exhausted { demand, .. } => {
                    let report = diagnosis::diagnose(
                        &ctx,
                        &index,
                        demand,
                        &search.placed_counts(),
                        search.blame(demand),
                    );
                    warn!(
                        event = "infeasible",
                        group = %report.class_group_id,
                        subject = %report.subject_id,
                        cause = ?report.cause,
                    );
                    GenerationError::Infeasible(Box::new(report))
                }
                SearchFailure::BudgetExceeded { placed } => {
                    warn!(
                        event = "budget_exceeded",
                        budget = self.config.max_backtracks,
                        placed,
                        required,
                    );
                    GenerationError::BacktrackBudgetExceeded {
                        budget: self.config.max_backtracks,
                        placed,
                        required,
                    }
                }
                SearchFailure::Cancelled => {
                    info!(event = "cancelled", phase = "Search");
                    GenerationError::Cancelled
                }
            });
        }
        let mut ledger = search.into_ledger();

        if self.config.optimization.enabled {
            info!(event = "phase_start", phase = "Optimization", phase_index = 1);
            let phase_started = Instant::now();
            let before = model.total_penalty(&ctx, &ledger);
            let improvement = optimize::improve(
                &ctx,
                &model,
                &mut ledger,
                &self.config.optimization,
                &self.cancel,
            )
            .map_err(|_| {
                info!(event = "cancelled", phase = "Optimization");
                GenerationError::Cancelled
            })?;
            stats.swaps = improvement.swaps;
            stats.rounds = improvement.rounds;
            info!(
                event = "phase_end",
                phase = "Optimization",
                phase_index = 1,
                duration_ms = phase_started.elapsed().as_millis() as u64,
                steps = improvement.swaps,
                rounds = improvement.rounds,
                penalty_before = before,
                penalty_after = model.total_penalty(&ctx, &ledger),
            );
        }
        stats.soft_penalty = model.total_penalty(&ctx, &ledger);

        let slots = assemble(&catalog, &demands, ledger.placements());
        if let Err(violations) = validate(&slots, snapshot) {
            error!(
                event = "internal_consistency",
                violations = violations.len(),
                first = %violations[0],
            );
            return Err(GenerationError::InternalConsistency(violations));
        }

        let kpi = ScheduleKpi::calculate(&slots, snapshot);
        if !kpi.uneven_groups.is_empty() {
            warn!(
                event = "uneven_load",
                groups = ?kpi.uneven_groups,
                max_daily_spread = kpi.max_daily_spread,
            );
        }
        info!(
            event = "generation_end",
            sessions = slots.len(),
            soft_penalty = stats.soft_penalty,
            duration_ms = started.elapsed().as_millis() as u64,
        );

        Ok(GenerationReport { slots, stats, kpi })
    }
}

impl Default for TimetableGenerator {
    fn default() -> Self {
        Self::new()
    }
}
