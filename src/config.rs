//! Engine configuration.
//!
//! Two layers of settings drive a run:
//!
//! - [`GenerationConstraints`]: per-request soft-constraint switches,
//!   supplied by the surrounding application.
//! - [`EngineConfig`]: operator-level tuning (search budget, optimization,
//!   penalty weights), loadable from TOML.
//!
//! Hours rounding is not engine tuning: it belongs to the snapshot
//! ([`Institution::hours_rounding`](crate::models::Institution)) and is
//! shared by generation and audit.
//!
//! # Examples
//!
//! ```
//! use u_timetable::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     max_backtracks = 5000
//!
//!     [optimization]
//!     max_rounds = 10
//!
//!     [weights]
//!     load_imbalance = 4
//! "#).unwrap();
//!
//! assert_eq!(config.max_backtracks, 5000);
//! assert_eq!(config.optimization.max_rounds, 10);
//! assert!(config.optimization.enabled);
//! assert_eq!(config.weights.load_imbalance, 4);
//! assert_eq!(config.weights.moved_lab, 20);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Soft-constraint switches for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConstraints {
    /// Sessions of one subject per group per day before a penalty applies.
    /// `0` disables the rule.
    pub max_same_subject_per_day: u32,
    /// Penalize gaps between same-subject sessions on one day.
    pub prefer_consecutive_lessons: bool,
    /// Penalize uneven daily loads of groups and teachers.
    pub balance_weekly_load: bool,
    /// Prefer keeping lab sessions where the previous schedule had them.
    pub preserve_lab_schedule: bool,
}

impl Default for GenerationConstraints {
    fn default() -> Self {
        Self {
            max_same_subject_per_day: 2,
            prefer_consecutive_lessons: true,
            balance_weekly_load: true,
            preserve_lab_schedule: true,
        }
    }
}

impl GenerationConstraints {
    /// Constraints with every soft rule switched off.
    pub fn none() -> Self {
        Self {
            max_same_subject_per_day: 0,
            prefer_consecutive_lessons: false,
            balance_weekly_load: false,
            preserve_lab_schedule: false,
        }
    }
}

/// Weights of the soft rules. A weight of 0 disables the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    /// Per session above `max_same_subject_per_day`.
    pub same_subject_excess: i64,
    /// Per gap between same-subject sessions on one day.
    pub non_consecutive: i64,
    /// Per unit of `n * sum(x^2) - (sum x)^2` over daily loads.
    pub load_imbalance: i64,
    /// Per pinned lab slot no longer used.
    pub moved_lab: i64,
    /// Per session outside a preferred room.
    pub non_preferred_room: i64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            same_subject_excess: 10,
            non_consecutive: 3,
            load_imbalance: 1,
            moved_lab: 20,
            non_preferred_room: 2,
        }
    }
}

/// Post-feasibility local search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Run the swap pass after a feasible schedule is found.
    pub enabled: bool,
    /// Maximum improvement rounds (full sweeps over placement pairs).
    pub max_rounds: u32,
    /// Seed for the pair visiting order.
    pub seed: u64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rounds: 50,
            seed: 42,
        }
    }
}

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undone commits before the search gives up.
    pub max_backtracks: u64,
    /// Local search pass.
    pub optimization: OptimizationConfig,
    /// Soft rule weights.
    pub weights: PenaltyWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_backtracks: 100_000,
            optimization: OptimizationConfig::default(),
            weights: PenaltyWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file is unreadable, malformed, or invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_backtracks == 0 {
            return Err(ConfigError::Invalid(
                "max_backtracks must be positive".into(),
            ));
        }
        let w = &self.weights;
        let weights = [
            ("same_subject_excess", w.same_subject_excess),
            ("non_consecutive", w.non_consecutive),
            ("load_imbalance", w.load_imbalance),
            ("moved_lab", w.moved_lab),
            ("non_preferred_room", w.non_preferred_room),
        ];
        if let Some((name, _)) = weights.iter().find(|(_, v)| *v < 0) {
            return Err(ConfigError::Invalid(format!(
                "weight {name} must not be negative"
            )));
        }
        Ok(())
    }

    /// Sets the backtrack budget.
    pub fn with_max_backtracks(mut self, budget: u64) -> Self {
        self.max_backtracks = budget;
        self
    }

    /// Enables or disables the optimization pass.
    pub fn with_optimization(mut self, enabled: bool) -> Self {
        self.optimization.enabled = enabled;
        self
    }

    /// Sets the soft rule weights.
    pub fn with_weights(mut self, weights: PenaltyWeights) -> Self {
        self.weights = weights;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.max_backtracks, 100_000);
        assert!(c.optimization.enabled);
        assert_eq!(c.optimization.seed, 42);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let c = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(c, EngineConfig::default());
    }

    #[test]
    fn test_rejects_zero_budget() {
        let err = EngineConfig::from_toml_str("max_backtracks = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let err = EngineConfig::from_toml_str("[weights]\nmoved_lab = -1").unwrap_err();
        assert!(err.to_string().contains("moved_lab"));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = EngineConfig::from_toml_str("max_backtracks = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/nonexistent/timetable.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_generation_constraints_serde_defaults() {
        let c: GenerationConstraints =
            serde_json::from_str(r#"{"max_same_subject_per_day": 3}"#).unwrap();
        assert_eq!(c.max_same_subject_per_day, 3);
        assert!(c.prefer_consecutive_lessons);
        assert_eq!(GenerationConstraints::none().max_same_subject_per_day, 0);
    }
}
