//! Round-scoped invalidation token shared by every layer

use crate::core::types::Round;

/// Tracks whether a layer's data is current for a combat round.
///
/// Starts dirty and uninitialized so the first query forces a compute.
/// `generation` increases on every `mark_clean`, letting a dependent layer
/// record which computation of its input it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundCache {
    last_round: Round,
    dirty: bool,
    initialized: bool,
    generation: u64,
}

impl Default for RoundCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundCache {
    pub fn new() -> Self {
        Self {
            last_round: -1,
            dirty: true,
            initialized: false,
            generation: 0,
        }
    }

    /// Data is current for `round`
    #[inline]
    pub fn is_valid(&self, round: Round) -> bool {
        self.initialized && !self.dirty && self.last_round == round
    }

    /// Request a recompute. Previously computed data stays readable.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self, round: Round) {
        self.last_round = round;
        self.dirty = false;
        self.initialized = true;
        self.generation += 1;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Round of the last completed compute
    pub fn last_round(&self) -> Option<Round> {
        self.initialized.then_some(self.last_round)
    }

    /// Number of completed computes
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
