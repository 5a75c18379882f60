//! Requirement derivation.
//!
//! Turns the annual subject hours of every class group into weekly
//! session demands:
//!
//! ```text
//! weekly = max(1, round(annual_hours / academic_weeks))   for hours > 0
//! ```
//!
//! The rounding rule is a [`RoundingPolicy`]. Demands are indexed densely
//! in group order (snapshot order), then subject ID order.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{ConfigurationError, ConfigurationIssue, IssueKind};
use crate::models::SubjectType;

/// How annual hours are converted to weekly sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Round to nearest, halves round up.
    #[default]
    Nearest,
    /// Round down.
    Floor,
    /// Round up.
    Ceil,
}

impl RoundingPolicy {
    /// Weekly sessions for `annual_hours` spread over `academic_weeks`.
    ///
    /// Zero hours give zero sessions; any positive load gives at least one.
    ///
    /// # Example
    /// ```
    /// use u_timetable::demand::RoundingPolicy;
    ///
    /// assert_eq!(RoundingPolicy::Nearest.weekly_count(60, 40), 2);
    /// assert_eq!(RoundingPolicy::Floor.weekly_count(60, 40), 1);
    /// assert_eq!(RoundingPolicy::Ceil.weekly_count(41, 40), 2);
    /// assert_eq!(RoundingPolicy::Floor.weekly_count(10, 40), 1);
    /// ```
    pub fn weekly_count(self, annual_hours: u32, academic_weeks: u32) -> u32 {
        if annual_hours == 0 {
            return 0;
        }
        let hours = u64::from(annual_hours);
        let weeks = u64::from(academic_weeks.max(1));
        let weekly = match self {
            RoundingPolicy::Nearest => (2 * hours + weeks) / (2 * weeks),
            RoundingPolicy::Floor => hours / weeks,
            RoundingPolicy::Ceil => hours.div_ceil(weeks),
        };
        // never above `annual_hours`, so it fits
        u32::try_from(weekly).unwrap_or(u32::MAX).max(1)
    }
}

/// Placement progress of a demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandStatus {
    Unplaced,
    PartiallyPlaced,
    FullyPlaced,
    /// Proven impossible to complete.
    Infeasible,
}

impl DemandStatus {
    /// Status from a placed count.
    pub fn from_count(placed: usize, weekly_count: u32) -> Self {
        match placed {
            0 => DemandStatus::Unplaced,
            n if n >= weekly_count as usize => DemandStatus::FullyPlaced,
            _ => DemandStatus::PartiallyPlaced,
        }
    }
}

/// Weekly sessions one class group needs of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    /// Dense index within the run.
    pub index: usize,
    pub class_group_id: String,
    pub subject_id: String,
    /// Catalog index of the group.
    pub group: usize,
    /// Catalog index of the subject.
    pub subject: usize,
    pub subject_type: SubjectType,
    /// Sessions per week.
    pub weekly_count: u32,
    /// Group size.
    pub students: u32,
    /// Source annual hours.
    pub annual_hours: u32,
}

impl Demand {
    /// Whether this is a lab demand.
    #[inline]
    pub fn is_lab(&self) -> bool {
        self.subject_type == SubjectType::Lab
    }
}

/// A demand's progress when a run stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandProgress {
    pub class_group_id: String,
    pub subject_id: String,
    pub weekly_count: u32,
    pub placed: usize,
    pub status: DemandStatus,
}

impl DemandProgress {
    /// Progress with the status implied by `placed`.
    pub fn new(demand: &Demand, placed: usize) -> Self {
        Self {
            class_group_id: demand.class_group_id.clone(),
            subject_id: demand.subject_id.clone(),
            weekly_count: demand.weekly_count,
            placed,
            status: DemandStatus::from_count(placed, demand.weekly_count),
        }
    }

    /// Overrides the status, e.g. to mark a proven failure.
    pub fn with_status(mut self, status: DemandStatus) -> Self {
        self.status = status;
        self
    }
}

/// Derives every demand of the catalog's snapshot.
///
/// # Errors
/// A group requiring a subject missing from the snapshot.
pub fn derive_demands(
    catalog: &Catalog<'_>,
    rounding: RoundingPolicy,
) -> Result<Vec<Demand>, ConfigurationError> {
    let snapshot = catalog.snapshot();
    let weeks = snapshot.institution.academic_weeks;
    let mut demands = Vec::new();
    let mut issues = Vec::new();

    for (g, group) in snapshot.class_groups.iter().enumerate() {
        for (subject_id, &hours) in &group.subject_hours {
            if hours == 0 {
                continue;
            }
            let Some(s) = catalog.subject_index(subject_id) else {
                issues.push(ConfigurationIssue::new(
                    IssueKind::UnknownSubject,
                    format!("Group '{}' requires unknown subject '{}'", group.id, subject_id),
                ));
                continue;
            };
            demands.push(Demand {
                index: demands.len(),
                class_group_id: group.id.clone(),
                subject_id: subject_id.clone(),
                group: g,
                subject: s,
                subject_type: catalog.subject(s).subject_type,
                weekly_count: rounding.weekly_count(hours, weeks),
                students: group.students_count,
                annual_hours: hours,
            });
        }
    }

    if issues.is_empty() {
        Ok(demands)
    } else {
        Err(ConfigurationError::new(issues))
    }
}
