//! Debounce state machine.
//!
//! A raw level is confirmed once it has been held for its minimum duration:
//! `on_min_us` for high, `off_min_us` for low. Confirmation happens either
//! on the edge that ends the hold or lazily when the value or a counter is
//! queried, whichever comes first, and each confirmed transition bumps its
//! counter exactly once.
//!
//! ```
//! use edgeio_core::{DebounceConfig, DebouncedValue, Level, Timestamp};
//! use edgeio_decoder::DebounceState;
//!
//! let config = DebounceConfig { on_min_us: 1_000, off_min_us: 1_000 };
//! let mut state = DebounceState::new(Level::High, Timestamp::ZERO, &config);
//!
//! // Not held long enough yet.
//! assert_eq!(state.read(Timestamp::from_micros(999)), DebouncedValue::Unknown);
//! assert_eq!(state.read(Timestamp::from_micros(1_000)), DebouncedValue::High);
//! assert_eq!(state.on_count(Timestamp::from_micros(5_000)), 1);
//! ```

use edgeio_core::{DebounceConfig, DebouncedValue, Level, Timestamp};

/// Per-line debounce state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceState {
    stable: DebouncedValue,
    raw_last_seen: Level,
    last_transition: Timestamp,
    on_min_us: u64,
    off_min_us: u64,
    on_count: u64,
    off_count: u64,
}

impl DebounceState {
    /// Start tracking a line currently at `initial`.
    pub fn new(initial: Level, now: Timestamp, config: &DebounceConfig) -> Self {
        Self {
            stable: DebouncedValue::Unknown,
            raw_last_seen: initial,
            last_transition: now,
            on_min_us: config.on_min_us,
            off_min_us: config.off_min_us,
            on_count: 0,
            off_count: 0,
        }
    }

    fn threshold(&self, level: Level) -> u64 {
        match level {
            Level::High => self.on_min_us,
            Level::Low => self.off_min_us,
        }
    }

    /// Commit `level` if it was held for `held_us` and is not already stable.
    fn commit_if_held(&mut self, level: Level, held_us: u64) -> Option<DebouncedValue> {
        let value = DebouncedValue::from(level);
        if held_us < self.threshold(level) || self.stable == value {
            return None;
        }

        self.stable = value;
        match level {
            Level::High => self.on_count = self.on_count.wrapping_add(1),
            Level::Low => self.off_count = self.off_count.wrapping_add(1),
        }
        Some(value)
    }

    fn settle(&mut self, now: Timestamp) -> Option<DebouncedValue> {
        let held = now.elapsed_since(self.last_transition);
        self.commit_if_held(self.raw_last_seen, held)
    }

    /// Process an edge interrupt reporting `level` at `now`.
    ///
    /// Returns the newly confirmed value when the edge ends a hold long
    /// enough to confirm the outgoing level. A report of the level already
    /// seen is ignored.
    pub fn on_edge(&mut self, level: Level, now: Timestamp) -> Option<DebouncedValue> {
        if level == self.raw_last_seen {
            return None;
        }

        let committed = self.settle(now);
        self.raw_last_seen = level;
        self.last_transition = now;
        committed
    }

    /// Stable value at `now`, confirming the current raw level if it has
    /// been held long enough.
    pub fn read(&mut self, now: Timestamp) -> DebouncedValue {
        self.settle(now);
        self.stable
    }

    /// Confirmed high transitions at `now`.
    pub fn on_count(&mut self, now: Timestamp) -> u64 {
        self.settle(now);
        self.on_count
    }

    /// Confirmed low transitions at `now`.
    pub fn off_count(&mut self, now: Timestamp) -> u64 {
        self.settle(now);
        self.off_count
    }

    /// Stable value without confirming anything.
    pub fn stable(&self) -> DebouncedValue {
        self.stable
    }

    /// Last raw level observed.
    pub fn raw_level(&self) -> Level {
        self.raw_last_seen
    }

    pub fn on_min_us(&self) -> u64 {
        self.on_min_us
    }

    pub fn off_min_us(&self) -> u64 {
        self.off_min_us
    }

    /// Replace the high threshold. Resets both counters and the stable value.
    pub fn set_on_min_us(&mut self, micros: u64) {
        self.on_min_us = micros;
        self.invalidate();
    }

    /// Replace the low threshold. Resets both counters and the stable value.
    pub fn set_off_min_us(&mut self, micros: u64) {
        self.off_min_us = micros;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.stable = DebouncedValue::Unknown;
        self.on_count = 0;
        self.off_count = 0;
    }
}
