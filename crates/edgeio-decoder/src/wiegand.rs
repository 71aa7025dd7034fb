//! Wiegand two-line decoder state machine.
//!
//! Each bit is a short low pulse on one of the two data lines: a pulse on
//! D0 encodes 0, a pulse on D1 encodes 1. A frame ends when no new pulse
//! starts within `pulse_interval_max_us` of the previous one.
//!
//! # Edge classification
//!
//! Assertion (line goes low):
//! - Same level as last recorded for the line: duplicate, frame kept
//! - Too soon after the previous pulse: `PulseTooEarly`
//! - Too late after the previous pulse: previous frame discarded, not noise
//! - Other line still low: `BothLinesActive`
//!
//! Deassertion (line goes high):
//! - Line is not the active one: `UnexpectedDeassert`
//! - Frame already holds 64 bits: bit dropped
//! - Pulse width outside its window: `PulseTooShort` / `PulseTooLong`
//! - Otherwise the bit is shifted in and the completion timer is rearmed
//!
//! Every classified violation resets the frame and becomes the pending noise
//! code, which is read and cleared by [`WiegandDecoder::take_noise`]. Only
//! one code is retained between two reads.

use edgeio_core::constants::WIEGAND_MAX_BITS;
use edgeio_core::{Error, NoiseCode, Result, Timestamp, WiegandFrame, WiegandLine, WiegandTiming};
use std::mem;
use tracing::{debug, trace};

/// Result of feeding one edge to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Reader disabled.
    Ignored,

    /// Line reported the level it was already at.
    Duplicate,

    /// A pulse started on a line.
    PulseStarted,

    /// A pulse ended inside its window and its bit was appended.
    BitAccepted {
        bit: u64,
        /// Time left until the frame is complete if no further pulse arrives.
        rearm_after_us: u64,
    },

    /// A valid pulse ended but the frame is already full.
    FrameFull,

    /// The edge violated a timing window and reset the frame.
    Noise(NoiseCode),
}

/// Decoding state of one Wiegand reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiegandDecoder {
    enabled: bool,
    data: u64,
    bit_count: u32,
    active_line: Option<WiegandLine>,
    line_was_low: [bool; 2],
    last_bit_ts: Timestamp,
    noise: NoiseCode,
    timing: WiegandTiming,
}

impl WiegandDecoder {
    /// Create a disabled decoder.
    pub fn new(timing: WiegandTiming) -> Self {
        Self {
            enabled: false,
            data: 0,
            bit_count: 0,
            active_line: None,
            line_was_low: [false; 2],
            last_bit_ts: Timestamp::ZERO,
            noise: NoiseCode::None,
            timing,
        }
    }

    /// Start decoding from a clean frame, clearing any pending noise.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.reset_frame();
        self.line_was_low = [false; 2];
        self.noise = NoiseCode::None;
    }

    /// Stop decoding. Later edges are ignored.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.active_line = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn reset_frame(&mut self) {
        self.data = 0;
        self.bit_count = 0;
        self.active_line = None;
    }

    fn noise(&mut self, code: NoiseCode) -> EdgeOutcome {
        debug!(noise = %code, bit_count = self.bit_count, "Wiegand noise, frame reset");
        self.reset_frame();
        self.noise = code;
        EdgeOutcome::Noise(code)
    }

    /// Feed an edge on `line`. `asserted` is true when the line went low.
    pub fn on_edge(&mut self, line: WiegandLine, asserted: bool, now: Timestamp) -> EdgeOutcome {
        if !self.enabled {
            return EdgeOutcome::Ignored;
        }

        let was_low = &mut self.line_was_low[line.index()];
        if *was_low == asserted {
            self.noise = NoiseCode::DuplicateEdge;
            return EdgeOutcome::Duplicate;
        }
        *was_low = asserted;

        if asserted {
            self.on_assert(line, now)
        } else {
            self.on_deassert(line, now)
        }
    }

    fn on_assert(&mut self, line: WiegandLine, now: Timestamp) -> EdgeOutcome {
        if self.bit_count > 0 {
            let interval = now.elapsed_since(self.last_bit_ts);
            if interval < self.timing.pulse_interval_min_us {
                return self.noise(NoiseCode::PulseTooEarly);
            }
            if interval > self.timing.pulse_interval_max_us {
                debug!(
                    interval_us = interval,
                    bit_count = self.bit_count,
                    "Wiegand frame expired, starting new frame"
                );
                self.data = 0;
                self.bit_count = 0;
            }
        }

        if self.active_line.is_some() {
            return self.noise(NoiseCode::BothLinesActive);
        }

        self.active_line = Some(line);
        self.last_bit_ts = now;
        EdgeOutcome::PulseStarted
    }

    fn on_deassert(&mut self, line: WiegandLine, now: Timestamp) -> EdgeOutcome {
        if self.active_line != Some(line) {
            return self.noise(NoiseCode::UnexpectedDeassert);
        }
        self.active_line = None;

        if self.bit_count >= WIEGAND_MAX_BITS {
            return EdgeOutcome::FrameFull;
        }

        let width = now.elapsed_since(self.last_bit_ts);
        if width < self.timing.pulse_width_min_us {
            return self.noise(NoiseCode::PulseTooShort);
        }
        if width > self.timing.pulse_width_max_us {
            return self.noise(NoiseCode::PulseTooLong);
        }

        let bit = line.bit();
        self.data = (self.data << 1) | bit;
        self.bit_count += 1;
        trace!(line = %line, bit, bit_count = self.bit_count, width_us = width, "Wiegand bit");

        EdgeOutcome::BitAccepted {
            bit,
            rearm_after_us: self.timing.pulse_interval_max_us.saturating_sub(width),
        }
    }

    /// Snapshot of the last frame.
    ///
    /// # Errors
    /// - `NotEnabled` if the decoder is disabled
    /// - `Busy` while a frame may still be accumulating, i.e. until more
    ///   than `pulse_interval_max_us` has passed since the last pulse started
    pub fn read_frame(&self, now: Timestamp) -> Result<WiegandFrame> {
        if !self.enabled {
            return Err(Error::NotEnabled);
        }
        if now.elapsed_since(self.last_bit_ts) <= self.timing.pulse_interval_max_us {
            return Err(Error::busy("Wiegand frame in progress"));
        }
        Ok(WiegandFrame {
            timestamp: self.last_bit_ts,
            bit_count: self.bit_count,
            data: self.data,
        })
    }

    /// Return the pending noise code and clear it.
    pub fn take_noise(&mut self) -> NoiseCode {
        mem::replace(&mut self.noise, NoiseCode::None)
    }

    /// Pending noise code, left in place.
    pub fn noise_code(&self) -> NoiseCode {
        self.noise
    }

    pub fn data(&self) -> u64 {
        self.data
    }

    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    /// Line currently inside its low half-cycle.
    pub fn active_line(&self) -> Option<WiegandLine> {
        self.active_line
    }

    pub fn last_bit_ts(&self) -> Timestamp {
        self.last_bit_ts
    }

    pub fn timing(&self) -> WiegandTiming {
        self.timing
    }

    pub fn set_pulse_width_min_us(&mut self, micros: u64) {
        self.timing.pulse_width_min_us = micros;
    }

    pub fn set_pulse_width_max_us(&mut self, micros: u64) {
        self.timing.pulse_width_max_us = micros;
    }

    pub fn set_pulse_interval_min_us(&mut self, micros: u64) {
        self.timing.pulse_interval_min_us = micros;
    }

    pub fn set_pulse_interval_max_us(&mut self, micros: u64) {
        self.timing.pulse_interval_max_us = micros;
    }
}
