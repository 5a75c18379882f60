//! Search state passed to dispatching rules.

/// Live search state, indexed by demand index.
///
/// Slices shorter than the demand count read as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderingContext<'a> {
    /// Alive candidates usable by the next session of each demand.
    pub live_candidates: &'a [usize],
    /// Sessions still to place per demand.
    pub remaining: &'a [u32],
    /// Qualified teachers per demand.
    pub teacher_options: &'a [usize],
}

impl<'a> OrderingContext<'a> {
    /// Creates a context over live candidate counts.
    pub fn new(live_candidates: &'a [usize]) -> Self {
        Self {
            live_candidates,
            ..Default::default()
        }
    }

    /// Sets remaining sessions.
    pub fn with_remaining(mut self, remaining: &'a [u32]) -> Self {
        self.remaining = remaining;
        self
    }

    /// Sets teacher option counts.
    pub fn with_teacher_options(mut self, teacher_options: &'a [usize]) -> Self {
        self.teacher_options = teacher_options;
        self
    }

    pub(crate) fn live(&self, demand: usize) -> usize {
        self.live_candidates.get(demand).copied().unwrap_or(0)
    }

    pub(crate) fn remaining_of(&self, demand: usize) -> u32 {
        self.remaining.get(demand).copied().unwrap_or(0)
    }

    pub(crate) fn teachers_of(&self, demand: usize) -> usize {
        self.teacher_options.get(demand).copied().unwrap_or(0)
    }
}
