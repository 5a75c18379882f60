//! Eligibility index.
//!
//! For each demand, the (slot, teacher, classroom) triples that pass every
//! hard rule against an empty timetable. Built once per run and never
//! mutated; the solver tracks which candidates are still alive separately.
//!
//! # Candidate Order
//! By slot, then teacher index, then preferred rooms first, then room
//! index. Candidates of one slot are contiguous, so
//! [`DemandEligibility::at_slot`] is a range lookup.

use std::ops::Range;

use crate::constraints::{ConstraintModel, Placement, RuleContext};

/// Static options of one demand.
#[derive(Debug, Clone, Default)]
pub struct DemandEligibility {
    /// Qualified teachers (catalog indices).
    pub teachers: Vec<usize>,
    /// Rooms that fit the demand, ignoring teacher-lab ownership.
    pub classrooms: Vec<usize>,
    /// Admissible placements.
    pub candidates: Vec<Placement>,
    /// `slot_start[s]..slot_start[s + 1]` are the candidates at slot `s`.
    slot_start: Vec<usize>,
}

impl DemandEligibility {
    /// Candidate positions at a slot.
    #[inline]
    pub fn at_slot(&self, slot: usize) -> Range<usize> {
        self.slot_start[slot]..self.slot_start[slot + 1]
    }

    /// Number of distinct slots with at least one candidate.
    pub fn slot_count(&self) -> usize {
        self.slot_start.windows(2).filter(|w| w[1] > w[0]).count()
    }

    /// Whether the demand has no candidates at all.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Candidates of every demand plus per-resource reverse indices.
#[derive(Debug, Clone, Default)]
pub struct EligibilityIndex {
    demands: Vec<DemandEligibility>,
    by_teacher: Vec<Vec<usize>>,
    by_classroom: Vec<Vec<usize>>,
    by_group: Vec<Vec<usize>>,
}

impl EligibilityIndex {
    /// Builds the index for every demand of the context.
    pub fn build(ctx: &RuleContext<'_>, model: &ConstraintModel) -> Self {
        let cat = ctx.catalog;
        let slot_count = cat.grid().len();
        let mut by_teacher = vec![Vec::new(); cat.teacher_count()];
        let mut by_classroom = vec![Vec::new(); cat.classroom_count()];
        let mut by_group = vec![Vec::new(); cat.group_count()];

        let demands = ctx
            .demands
            .iter()
            .map(|demand| {
                let teachers: Vec<usize> = (0..cat.teacher_count())
                    .filter(|&t| cat.is_qualified(t, demand.subject, demand.group))
                    .collect();
                let classrooms: Vec<usize> = (0..cat.classroom_count())
                    .filter(|&r| {
                        cat.room_fit(demand.subject, demand.group, r, None)
                            .is_suitable()
                    })
                    .collect();

                // rooms per teacher, preferred first
                let room_orders: Vec<(usize, Vec<usize>)> = teachers
                    .iter()
                    .map(|&t| {
                        let preferred = cat.preferred_rooms(demand.group, demand.subject, t);
                        let mut rooms = classrooms.clone();
                        rooms.sort_by_key(|r| (!preferred.contains(r), *r));
                        (t, rooms)
                    })
                    .collect();

                let mut candidates = Vec::new();
                let mut slot_start = Vec::with_capacity(slot_count + 1);
                for slot in 0..slot_count {
                    slot_start.push(candidates.len());
                    for (teacher, rooms) in &room_orders {
                        for &classroom in rooms {
                            let p = Placement {
                                demand: demand.index,
                                slot,
                                teacher: *teacher,
                                classroom,
                            };
                            if model.admits(ctx, None, &p) {
                                candidates.push(p);
                            }
                        }
                    }
                }
                slot_start.push(candidates.len());

                let used_teachers = teachers
                    .iter()
                    .filter(|&&t| candidates.iter().any(|p| p.teacher == t));
                for &t in used_teachers {
                    by_teacher[t].push(demand.index);
                }
                for &r in &classrooms {
                    if candidates.iter().any(|p| p.classroom == r) {
                        by_classroom[r].push(demand.index);
                    }
                }
                by_group[demand.group].push(demand.index);

                DemandEligibility {
                    teachers,
                    classrooms,
                    candidates,
                    slot_start,
                }
            })
            .collect();

        Self {
            demands,
            by_teacher,
            by_classroom,
            by_group,
        }
    }

    /// Options of a demand.
    pub fn demand(&self, demand: usize) -> &DemandEligibility {
        &self.demands[demand]
    }

    /// Number of indexed demands.
    pub fn len(&self) -> usize {
        self.demands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demands.is_empty()
    }

    /// Candidate of a demand by position.
    #[inline]
    pub fn candidate(&self, demand: usize, position: usize) -> &Placement {
        &self.demands[demand].candidates[position]
    }

    /// Candidates of a demand at a slot.
    pub fn candidates_at(&self, demand: usize, slot: usize) -> &[Placement] {
        let d = &self.demands[demand];
        &d.candidates[d.at_slot(slot)]
    }

    /// Demands that may use a teacher.
    pub fn demands_of_teacher(&self, teacher: usize) -> &[usize] {
        &self.by_teacher[teacher]
    }

    /// Demands that may use a classroom.
    pub fn demands_of_classroom(&self, classroom: usize) -> &[usize] {
        &self.by_classroom[classroom]
    }

    /// Demands of a group.
    pub fn demands_of_group(&self, group: usize) -> &[usize] {
        &self.by_group[group]
    }
}
