//! Timetabling domain models.
//!
//! Entities are owned by the surrounding application and handed to the
//! engine as a read-only [`Snapshot`]. The only artifact the engine
//! produces is a list of [`ScheduleSlot`]s.
//!
//! # Domain Mappings
//!
//! | u-timetable | Resource dimension | Notes |
//! |-------------|--------------------|-------|
//! | ClassGroup | attendee | one session per slot |
//! | Teacher | performer | availability per day |
//! | Classroom | location | type, capacity, ownership |
//! | Institution | time | days x lessons |

mod classroom;
mod group;
mod institution;
mod schedule;
mod snapshot;
mod subject;
mod teacher;

pub use classroom::{Classroom, ClassroomType};
pub use group::ClassGroup;
pub use institution::{ClockTime, Institution, ParseClockTimeError, MINUTES_PER_DAY};
pub use schedule::{ConstraintViolation, ScheduleSlot, ViolationKind};
pub use snapshot::Snapshot;
pub use subject::{Subject, SubjectType};
pub use teacher::Teacher;
