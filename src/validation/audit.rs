//! Timetable audit.
//!
//! Checks a list of [`ScheduleSlot`]s against a snapshot from scratch,
//! without any state from the run that produced it. The generator audits
//! its own output this way; callers can audit timetables edited by hand.
//!
//! # Steps
//!
//! 1. Build the catalog (an invalid snapshot is reported as such)
//! 2. Resolve every entry: known IDs, a grid slot, matching times
//! 3. Run every hard rule over the resolved entries
//!
//! Entries that fail resolution are reported once and left out of the
//! rule checks.

use crate::catalog::Catalog;
use crate::constraints::{HardRule, Pins, ResolvedSlot, RuleContext};
use crate::demand::derive_demands;
use crate::models::{ConstraintViolation, ScheduleSlot, Snapshot, ViolationKind};

/// Audits a timetable.
///
/// Weekly session counts use the snapshot's own
/// [`hours_rounding`](crate::models::Institution::hours_rounding).
///
/// # Returns
/// `Ok(())` if no hard rule is broken, `Err` with every violation found.
pub fn validate(
    slots: &[ScheduleSlot],
    snapshot: &Snapshot,
) -> Result<(), Vec<ConstraintViolation>> {
    let invalid = |message: String| {
        vec![ConstraintViolation::new(
            ViolationKind::InvalidSnapshot,
            &snapshot.institution.name,
            Vec::new(),
            message,
        )]
    };
    let catalog = Catalog::new(snapshot).map_err(|e| invalid(e.to_string()))?;
    let demands = derive_demands(&catalog, snapshot.institution.hours_rounding)
        .map_err(|e| invalid(e.to_string()))?;
    let pins = Pins::none(demands.len());
    let ctx = RuleContext::new(&catalog, &demands, &pins);

    let mut violations = Vec::new();
    let mut resolved = Vec::with_capacity(slots.len());
    for (position, entry) in slots.iter().enumerate() {
        match resolve(&ctx, position, entry) {
            Ok(r) => resolved.push(r),
            Err(v) => violations.push(v),
        }
    }

    for rule in HardRule::ALL {
        violations.extend(rule.audit(&ctx, &resolved));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn resolve(
    ctx: &RuleContext<'_>,
    position: usize,
    entry: &ScheduleSlot,
) -> Result<ResolvedSlot, ConstraintViolation> {
    let cat = ctx.catalog;
    let unknown = |what: &str, id: &str| {
        ConstraintViolation::new(
            ViolationKind::UnknownReference,
            id,
            vec![position],
            format!("Entry {position} references unknown {what} '{id}'"),
        )
    };

    let group = cat
        .group_index(&entry.class_group_id)
        .ok_or_else(|| unknown("group", &entry.class_group_id))?;
    let subject = cat
        .subject_index(&entry.subject_id)
        .ok_or_else(|| unknown("subject", &entry.subject_id))?;
    let teacher = cat
        .teacher_index(&entry.teacher_id)
        .ok_or_else(|| unknown("teacher", &entry.teacher_id))?;
    let classroom = cat
        .classroom_index(&entry.classroom_id)
        .ok_or_else(|| unknown("classroom", &entry.classroom_id))?;

    let grid = cat.grid();
    let slot = grid.locate(&entry.day, entry.lesson_number).ok_or_else(|| {
        ConstraintViolation::new(
            ViolationKind::OutsideGrid,
            &entry.day,
            vec![position],
            format!(
                "Entry {position} is on {} lesson {}, outside the grid",
                entry.day, entry.lesson_number
            ),
        )
    })?;
    let s = grid.slot(slot);
    if s.start != entry.start_time || s.end != entry.end_time {
        return Err(ConstraintViolation::new(
            ViolationKind::OutsideGrid,
            &entry.day,
            vec![position],
            format!(
                "Entry {position} runs {}-{}, but {} lesson {} is {}-{}",
                entry.start_time, entry.end_time, entry.day, entry.lesson_number, s.start, s.end
            ),
        ));
    }

    Ok(ResolvedSlot {
        position,
        slot,
        group,
        subject,
        teacher,
        classroom,
        demand: ctx.demand_of(group, subject),
    })
}
