//! Error taxonomy of a generation run.
//!
//! | Error | Meaning | Caller action |
//! |-------|---------|---------------|
//! | `Configuration` | stale or inconsistent snapshot | fix the data |
//! | `InvalidConfig` | engine settings out of range | fix the settings |
//! | `Infeasible` | no complete placement exists | add resources |
//! | `BacktrackBudgetExceeded` | search gave up, nothing proven | retry with a larger budget |
//! | `InternalConsistency` | solver output breaks a hard rule | report a bug |
//! | `Cancelled` | cancellation requested | none |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::grid::GridError;
use crate::models::ConstraintViolation;
use crate::scheduler::InfeasibilityReport;

/// A single snapshot consistency problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationIssue {
    /// Issue category.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of snapshot problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Two entities of the same kind share an ID.
    DuplicateId,
    /// A reference to a subject that does not exist.
    UnknownSubject,
    /// A reference to a group that does not exist.
    UnknownGroup,
    /// A reference to a teacher that does not exist.
    UnknownTeacher,
    /// A reference to a classroom that does not exist.
    UnknownClassroom,
    /// Institution settings cannot produce a valid grid.
    InvalidInstitution,
}

impl ConfigurationIssue {
    pub(crate) fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The snapshot cannot be scheduled as given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid snapshot: {}", summarize(.issues))]
pub struct ConfigurationError {
    /// Every issue found.
    pub issues: Vec<ConfigurationIssue>,
}

impl ConfigurationError {
    /// Wraps a list of issues.
    pub fn new(issues: Vec<ConfigurationIssue>) -> Self {
        Self { issues }
    }

    /// Whether any issue has the given kind.
    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

impl From<GridError> for ConfigurationError {
    fn from(err: GridError) -> Self {
        Self::new(vec![ConfigurationIssue::new(
            IssueKind::InvalidInstitution,
            err.to_string(),
        )])
    }
}

fn summarize(issues: &[ConfigurationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of a generation run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("{0}")]
    Infeasible(Box<InfeasibilityReport>),

    #[error("backtrack budget of {budget} steps exhausted after placing {placed} of {required} sessions")]
    BacktrackBudgetExceeded {
        budget: u64,
        placed: usize,
        required: usize,
    },

    #[error("internal consistency error: solver output violates {} hard constraint(s)", .0.len())]
    InternalConsistency(Vec<ConstraintViolation>),

    #[error("generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// The infeasibility report, if this is an infeasibility failure.
    pub fn infeasibility(&self) -> Option<&InfeasibilityReport> {
        match self {
            GenerationError::Infeasible(report) => Some(report),
            _ => None,
        }
    }
}
