//! Converts committed placements into published schedule entries.

use crate::catalog::Catalog;
use crate::constraints::Placement;
use crate::demand::Demand;
use crate::models::ScheduleSlot;

/// Builds schedule entries, ordered by day, lesson, group and subject.
pub fn assemble<'p>(
    catalog: &Catalog<'_>,
    demands: &[Demand],
    placements: impl IntoIterator<Item = &'p Placement>,
) -> Vec<ScheduleSlot> {
    let grid = catalog.grid();
    let mut keyed: Vec<(usize, ScheduleSlot)> = placements
        .into_iter()
        .map(|p| {
            let demand = &demands[p.demand];
            let slot = grid.slot(p.slot);
            let entry = ScheduleSlot {
                day: grid.day_name(slot.day_index).to_string(),
                lesson_number: slot.lesson_number,
                class_group_id: demand.class_group_id.clone(),
                subject_id: demand.subject_id.clone(),
                teacher_id: catalog.teacher(p.teacher).id.clone(),
                classroom_id: catalog.classroom(p.classroom).id.clone(),
                start_time: slot.start,
                end_time: slot.end,
            };
            (p.slot, entry)
        })
        .collect();
    keyed.sort_by(|(a, x), (b, y)| {
        a.cmp(b)
            .then_with(|| x.class_group_id.cmp(&y.class_group_id))
            .then_with(|| x.subject_id.cmp(&y.subject_id))
    });
    keyed.into_iter().map(|(_, entry)| entry).collect()
}
