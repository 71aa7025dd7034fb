//! Shared fixtures for decoder integration tests.
//!
//! A [`Rig`] bundles the mock GPIO controller, clock and scheduler that a
//! reader runs against. Helpers keep the mock clock in step with the edge
//! timestamps so completion timers get realistic deadlines.

#![allow(dead_code)]

use edgeio_core::{Level, LineId, Timestamp, WiegandReaderConfig, WiegandTiming};
use edgeio_decoder::WiegandReader;
use edgeio_hardware::mock::{MockClock, MockGpio, MockScheduler};
use std::sync::Arc;

/// Data-0 line used by every fixture reader.
pub const D0: LineId = LineId::new(4);

/// Data-1 line used by every fixture reader.
pub const D1: LineId = LineId::new(5);

pub fn ts(micros: u64) -> Timestamp {
    Timestamp::from_micros(micros)
}

pub struct Rig {
    pub gpio: MockGpio,
    pub clock: MockClock,
    pub scheduler: MockScheduler,
}

impl Rig {
    pub fn new() -> Self {
        let clock = MockClock::new();
        Self {
            gpio: MockGpio::with_lines([D0, D1]),
            scheduler: MockScheduler::new(clock.clone()),
            clock,
        }
    }

    pub fn reader(&self) -> WiegandReader {
        self.reader_with(WiegandTiming::default())
    }

    pub fn reader_with(&self, timing: WiegandTiming) -> WiegandReader {
        let config = WiegandReaderConfig {
            name: "wiegand".to_string(),
            d0: D0,
            d1: D1,
            timing,
        };
        WiegandReader::new(
            &config,
            Arc::new(self.gpio.clone()),
            Arc::new(self.scheduler.clone()),
            Arc::new(self.clock.clone()),
        )
    }

    /// Drive `line` to `level` at `at` microseconds.
    pub fn edge(&self, line: LineId, level: Level, at: u64) {
        self.clock.set(at);
        self.gpio.set_level(line, level, ts(at)).unwrap();
    }

    /// Low pulse on `line` starting at `start`.
    pub fn pulse(&self, line: LineId, start: u64, width: u64) {
        self.edge(line, Level::Low, start);
        self.edge(line, Level::High, start + width);
    }

    /// Send `bits` (MSB first) with valid timing, starting at `start`.
    /// Returns the start time of the last pulse.
    pub fn send_bits(&self, bits: &[u8], start: u64) -> u64 {
        let mut at = start;
        for (i, bit) in bits.iter().enumerate() {
            if i > 0 {
                at += 1_500;
            }
            let line = if *bit == 0 { D0 } else { D1 };
            self.pulse(line, at, 50);
        }
        at
    }
}
