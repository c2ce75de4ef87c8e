//! Fairness among AI rebels during the simultaneous step.

use std::collections::BTreeMap;

use crate::board::Seat;

/// Actions taken per AI rebel since the step was last entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebelBatching {
    taken: BTreeMap<Seat, u32>,
}

impl RebelBatching {
    pub fn reset(&mut self) {
        self.taken.clear();
    }

    pub fn record(&mut self, seat: Seat) {
        *self.taken.entry(seat).or_insert(0) += 1;
    }

    pub fn count(&self, seat: Seat) -> u32 {
        self.taken.get(&seat).copied().unwrap_or(0)
    }

    /// An AI rebel is gated while it is ahead of the slowest active AI rebel.
    /// Seats outside `active_ai` are never gated.
    pub fn is_gated(&self, seat: Seat, active_ai: &[Seat]) -> bool {
        if !active_ai.contains(&seat) {
            return false;
        }
        let slowest = active_ai
            .iter()
            .map(|&s| self.count(s))
            .min()
            .unwrap_or(0);
        self.count(seat) > slowest
    }
}
