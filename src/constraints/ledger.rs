//! Busy tables of a partial timetable.
//!
//! Direct-indexed by `resource * slot_count + slot`, so every clash test
//! is a single array lookup. Daily tallies per demand, group and teacher
//! feed the soft rules without rescanning placements.

use crate::catalog::Catalog;
use crate::demand::Demand;

/// One committed session: a demand at a slot with a teacher and a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Placement {
    pub demand: usize,
    pub slot: usize,
    pub teacher: usize,
    pub classroom: usize,
}

/// Occupancy of teachers, classrooms and groups.
#[derive(Debug, Clone)]
pub struct Ledger {
    slot_count: usize,
    day_count: usize,
    lessons_per_day: usize,
    demand_group: Vec<usize>,
    teacher_at: Vec<Option<usize>>,
    classroom_at: Vec<Option<usize>>,
    group_at: Vec<Option<usize>>,
    demand_day: Vec<u32>,
    group_day: Vec<u32>,
    teacher_day: Vec<u32>,
    by_demand: Vec<Vec<Placement>>,
    len: usize,
}

impl Ledger {
    /// Creates an empty ledger sized for a run.
    pub fn new(catalog: &Catalog<'_>, demands: &[Demand]) -> Self {
        let grid = catalog.grid();
        let slot_count = grid.len();
        let day_count = grid.day_count();
        Self {
            slot_count,
            day_count,
            lessons_per_day: grid.lessons_per_day() as usize,
            demand_group: demands.iter().map(|d| d.group).collect(),
            teacher_at: vec![None; catalog.teacher_count() * slot_count],
            classroom_at: vec![None; catalog.classroom_count() * slot_count],
            group_at: vec![None; catalog.group_count() * slot_count],
            demand_day: vec![0; demands.len() * day_count],
            group_day: vec![0; catalog.group_count() * day_count],
            teacher_day: vec![0; catalog.teacher_count() * day_count],
            by_demand: vec![Vec::new(); demands.len()],
            len: 0,
        }
    }

    /// Records a placement. The caller has checked that it is admissible.
    pub fn add(&mut self, p: Placement) {
        let g = self.demand_group[p.demand];
        let day = self.day_of(p.slot);
        debug_assert!(self.teacher_free(p.teacher, p.slot));
        debug_assert!(self.classroom_free(p.classroom, p.slot));
        debug_assert!(self.group_free(g, p.slot));

        self.teacher_at[p.teacher * self.slot_count + p.slot] = Some(p.demand);
        self.classroom_at[p.classroom * self.slot_count + p.slot] = Some(p.demand);
        self.group_at[g * self.slot_count + p.slot] = Some(p.demand);
        self.demand_day[p.demand * self.day_count + day] += 1;
        self.group_day[g * self.day_count + day] += 1;
        self.teacher_day[p.teacher * self.day_count + day] += 1;
        self.by_demand[p.demand].push(p);
        self.len += 1;
    }

    /// Removes a placement. Returns `false` if it was not recorded.
    pub fn remove(&mut self, p: Placement) -> bool {
        let Some(pos) = self.by_demand[p.demand].iter().rposition(|q| *q == p) else {
            return false;
        };
        self.by_demand[p.demand].remove(pos);
        let g = self.demand_group[p.demand];
        let day = self.day_of(p.slot);
        self.teacher_at[p.teacher * self.slot_count + p.slot] = None;
        self.classroom_at[p.classroom * self.slot_count + p.slot] = None;
        self.group_at[g * self.slot_count + p.slot] = None;
        self.demand_day[p.demand * self.day_count + day] -= 1;
        self.group_day[g * self.day_count + day] -= 1;
        self.teacher_day[p.teacher * self.day_count + day] -= 1;
        self.len -= 1;
        true
    }

    #[inline]
    pub fn teacher_free(&self, teacher: usize, slot: usize) -> bool {
        self.teacher_at[teacher * self.slot_count + slot].is_none()
    }

    #[inline]
    pub fn classroom_free(&self, classroom: usize, slot: usize) -> bool {
        self.classroom_at[classroom * self.slot_count + slot].is_none()
    }

    #[inline]
    pub fn group_free(&self, group: usize, slot: usize) -> bool {
        self.group_at[group * self.slot_count + slot].is_none()
    }

    /// Sessions placed for a demand.
    #[inline]
    pub fn placed(&self, demand: usize) -> usize {
        self.by_demand[demand].len()
    }

    /// Placements of a demand, in insertion order.
    pub fn placements_of(&self, demand: usize) -> &[Placement] {
        &self.by_demand[demand]
    }

    /// Every placement, grouped by demand.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> + '_ {
        self.by_demand.iter().flatten()
    }

    /// Total placed sessions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Day position of a slot.
    #[inline]
    pub fn day_of(&self, slot: usize) -> usize {
        slot / self.lessons_per_day
    }

    /// Lesson position (0-based) of a slot within its day.
    #[inline]
    pub fn lesson_of(&self, slot: usize) -> usize {
        slot % self.lessons_per_day
    }

    pub fn day_count(&self) -> usize {
        self.day_count
    }

    /// Sessions per day of a demand.
    pub fn demand_days(&self, demand: usize) -> &[u32] {
        &self.demand_day[demand * self.day_count..(demand + 1) * self.day_count]
    }

    /// Sessions per day of a group.
    pub fn group_days(&self, group: usize) -> &[u32] {
        &self.group_day[group * self.day_count..(group + 1) * self.day_count]
    }

    /// Sessions per day of a teacher.
    pub fn teacher_days(&self, teacher: usize) -> &[u32] {
        &self.teacher_day[teacher * self.day_count..(teacher + 1) * self.day_count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::{derive_demands, RoundingPolicy};
    use crate::testing;

    #[test]
    fn test_add_and_remove() {
        let snap = testing::trivial_snapshot();
        let cat = Catalog::new(&snap).unwrap();
        let demands = derive_demands(&cat, RoundingPolicy::Nearest).unwrap();
        let mut ledger = Ledger::new(&cat, &demands);

        let p = Placement { demand: 0, slot: 6, teacher: 0, classroom: 0 };
        ledger.add(p);
        assert!(!ledger.teacher_free(0, 6));
        assert!(!ledger.classroom_free(0, 6));
        assert!(!ledger.group_free(0, 6));
        assert!(ledger.teacher_free(0, 5));
        assert_eq!(ledger.placed(0), 1);
        assert_eq!(ledger.demand_days(0), &[0, 1, 0, 0, 0]);
        assert_eq!(ledger.teacher_days(0), &[0, 1, 0, 0, 0]);
        assert_eq!(ledger.lesson_of(6), 1);

        assert!(ledger.remove(p));
        assert!(!ledger.remove(p));
        assert!(ledger.is_empty());
        assert!(ledger.group_free(0, 6));
        assert_eq!(ledger.group_days(0), &[0, 0, 0, 0, 0]);
    }
}
