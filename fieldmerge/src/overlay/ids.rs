//! Region-scoped identifier generator.

use crate::feature::Feature;

/// Monotonic identifier sequence for one region's overlay run.
///
/// Identifiers handed out by one sequence are strictly increasing and never
/// reused, across any number of [`assign`](Self::assign) calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    /// A sequence whose first identifier is 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// The identifier the next call to [`next_id`](Self::next_id) returns.
    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Gives every feature a fresh identifier, in slice order.
    pub fn assign(&mut self, features: &mut [Feature]) {
        for feature in features {
            feature.id = self.next_id();
        }
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}
