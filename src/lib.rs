//! Timetable generation engine.
//!
//! Turns a read-only [`Snapshot`](models::Snapshot) of an educational
//! institution (working week, class groups with annual subject hours,
//! subjects, classrooms, teachers) into a weekly timetable of
//! [`ScheduleSlot`](models::ScheduleSlot)s that satisfies every hard rule,
//! or explains why none exists.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Institution`, `ClassGroup`, `Subject`,
//!   `Classroom`, `Teacher`, `Snapshot`, `ScheduleSlot`
//! - **`grid`**: The weekly (day, lesson) slot grid with clock times
//! - **`demand`**: Annual hours to weekly session demands
//! - **`catalog`**: Dense indices and resource compatibility rules
//! - **`constraints`**: Hard and soft rules over a busy-table ledger
//! - **`eligibility`**: Admissible (slot, teacher, room) candidates per demand
//! - **`dispatching`**: Demand ordering rules and the rule engine
//! - **`scheduler`**: Search, optimization, diagnosis and KPIs
//! - **`validation`**: Snapshot integrity checks and timetable audit
//! - **`config`**: Request switches and TOML-loadable engine settings
//!
//! # Example
//!
//! ```
//! use u_timetable::config::GenerationConstraints;
//! use u_timetable::models::{ClassGroup, Classroom, Institution, Snapshot, Subject, Teacher};
//!
//! let institution = Institution::new("College");
//! let days = institution.working_days.clone();
//! let snapshot = Snapshot::new(institution)
//!     .with_subject(Subject::theory("MATH", "Mathematics").with_teacher("T1"))
//!     .with_group(ClassGroup::new("G1").with_subject_hours("MATH", 120))
//!     .with_classroom(Classroom::theory("R1"))
//!     .with_teacher(
//!         Teacher::new("T1")
//!             .with_subject("Mathematics")
//!             .with_group("G1")
//!             .available_all(days, 4),
//!     );
//!
//! let slots = u_timetable::generate(&snapshot, &GenerationConstraints::default(), &[]).unwrap();
//! assert_eq!(slots.len(), 3);
//! assert!(u_timetable::validate(&slots, &snapshot).is_ok());
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Prosser (1993), "Hybrid Algorithms for the Constraint Satisfaction Problem"
//! - Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//!   Constraint Satisfaction Problems"

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod constraints;
pub mod demand;
pub mod dispatching;
pub mod eligibility;
pub mod error;
pub mod grid;
pub mod models;
pub mod scheduler;
pub mod validation;

#[cfg(test)]
mod testing;

pub use config::{EngineConfig, GenerationConstraints};
pub use error::{ConfigurationError, GenerationError};
pub use scheduler::{CancellationToken, TimetableGenerator};
pub use validation::validate;

use models::{ScheduleSlot, Snapshot};

/// Generates a timetable with the default engine configuration.
///
/// Shorthand for [`TimetableGenerator::new`] followed by
/// [`TimetableGenerator::generate`].
pub fn generate(
    snapshot: &Snapshot,
    constraints: &GenerationConstraints,
    previous: &[ScheduleSlot],
) -> Result<Vec<ScheduleSlot>, GenerationError> {
    TimetableGenerator::new().generate(snapshot, constraints, previous)
}
