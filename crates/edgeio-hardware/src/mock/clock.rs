//! Manually driven clock.

use crate::traits::Clock;
use edgeio_core::Timestamp;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Clock whose time only moves when told to.
///
/// Clones share the same time source.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    micros: Arc<AtomicU64>,
}

impl MockClock {
    /// Create a clock reading 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock reading `micros`.
    pub fn at(micros: u64) -> Self {
        let clock = Self::new();
        clock.set(micros);
        clock
    }

    /// Jump to an absolute time.
    pub fn set(&self, micros: u64) {
        self.micros.store(micros, Ordering::SeqCst);
    }

    /// Move time forward and return the new reading.
    pub fn advance(&self, micros: u64) -> Timestamp {
        let previous = self.micros.fetch_add(micros, Ordering::SeqCst);
        Timestamp::from_micros(previous.saturating_add(micros))
    }
}

impl Clock for MockClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.micros.load(Ordering::SeqCst))
    }
}
