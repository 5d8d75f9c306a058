//! Per-class quota accounting
//!
//! A limited class stops once `accepted >= limit - 1`, checked after every
//! evaluated seed whether it was accepted or not. A limit of 3 therefore
//! yields at most 2 patches, and a limit of 1 stops after the first seed.
//! Existing patch frames were sampled with this boundary.

use crate::io::configuration::MaxPerClass;

/// Tracks accepted patches for one class against its cap
#[derive(Clone, Copy, Debug)]
pub struct QuotaTracker {
    limit: MaxPerClass,
    accepted: usize,
}

impl QuotaTracker {
    /// Start counting for a new class
    pub const fn new(limit: MaxPerClass) -> Self {
        Self { limit, accepted: 0 }
    }

    /// Record the outcome of one evaluated seed
    pub const fn record(&mut self, accepted: bool) {
        if accepted {
            self.accepted += 1;
        }
    }

    /// Patches accepted so far
    pub const fn accepted(&self) -> usize {
        self.accepted
    }

    /// Whether the class must stop drawing seeds
    pub const fn is_reached(&self) -> bool {
        match self.limit {
            MaxPerClass::All => false,
            MaxPerClass::Limit(limit) => self.accepted >= limit.saturating_sub(1),
        }
    }
}
