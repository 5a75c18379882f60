//! Live candidate domains for forward checking.
//!
//! Tracks, per demand, which eligibility candidates are still compatible
//! with the committed placements, plus per-slot alive counts so the
//! number of usable slots is a short scan.

use crate::eligibility::EligibilityIndex;

/// Resource shared by a committed placement and a pruned candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dimension {
    Teacher,
    Classroom,
    Group,
}

impl Dimension {
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Dimension::Teacher => 0,
            Dimension::Classroom => 1,
            Dimension::Group => 2,
        }
    }
}

/// Alive flags over an eligibility index.
#[derive(Debug, Clone)]
pub(crate) struct Domains {
    alive: Vec<Vec<bool>>,
    slot_alive: Vec<Vec<u32>>,
}

impl Domains {
    /// Every candidate alive.
    pub(crate) fn new(index: &EligibilityIndex, slot_count: usize) -> Self {
        let mut alive = Vec::with_capacity(index.len());
        let mut slot_alive = Vec::with_capacity(index.len());
        for d in 0..index.len() {
            let e = index.demand(d);
            alive.push(vec![true; e.candidates.len()]);
            slot_alive.push((0..slot_count).map(|s| e.at_slot(s).len() as u32).collect());
        }
        Self { alive, slot_alive }
    }

    #[inline]
    pub(crate) fn is_alive(&self, demand: usize, candidate: usize) -> bool {
        self.alive[demand][candidate]
    }

    /// Marks a candidate dead. Returns `false` if it already was.
    pub(crate) fn kill(&mut self, demand: usize, candidate: usize, slot: usize) -> bool {
        if !self.alive[demand][candidate] {
            return false;
        }
        self.alive[demand][candidate] = false;
        self.slot_alive[demand][slot] -= 1;
        true
    }

    /// Restores a candidate killed earlier.
    pub(crate) fn revive(&mut self, demand: usize, candidate: usize, slot: usize) {
        debug_assert!(!self.alive[demand][candidate]);
        self.alive[demand][candidate] = true;
        self.slot_alive[demand][slot] += 1;
    }

    /// Alive slots and candidates strictly after `floor`.
    pub(crate) fn live_after(&self, demand: usize, floor: Option<usize>) -> (usize, usize) {
        let start = floor.map_or(0, |f| f + 1);
        self.slot_alive[demand]
            .iter()
            .skip(start)
            .filter(|&&n| n > 0)
            .fold((0, 0), |(slots, candidates), &n| (slots + 1, candidates + n as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::constraints::{ConstraintModel, Pins, RuleContext};
    use crate::demand::{derive_demands, RoundingPolicy};
    use crate::testing;

    #[test]
    fn test_kill_and_revive() {
        let snap = testing::trivial_snapshot();
        let cat = Catalog::new(&snap).unwrap();
        let demands = derive_demands(&cat, RoundingPolicy::Nearest).unwrap();
        let pins = Pins::none(demands.len());
        let ctx = RuleContext::new(&cat, &demands, &pins);
        let index = EligibilityIndex::build(&ctx, &ConstraintModel::hard_only());
        let mut domains = Domains::new(&index, cat.grid().len());

        assert_eq!(domains.live_after(0, None), (25, 25));
        assert_eq!(domains.live_after(0, Some(4)), (20, 20));

        assert!(domains.kill(0, 7, 7));
        assert!(!domains.kill(0, 7, 7));
        assert!(!domains.is_alive(0, 7));
        assert_eq!(domains.live_after(0, None), (24, 24));

        domains.revive(0, 7, 7);
        assert!(domains.is_alive(0, 7));
        assert_eq!(domains.live_after(0, None), (25, 25));
        assert_eq!(Dimension::Classroom.index(), 1);
    }
}
