//! Edge-timed input decoding.
//!
//! This crate turns raw, unsynchronized edge interrupts into validated
//! logical data. It contains two independent engines, each split into a
//! pure state machine and a driver that wires it to the platform:
//!
//! | State machine | Driver | Purpose |
//! |---------------|--------|---------|
//! | [`DebounceState`] | [`DebouncedInput`] | Stable level and on/off counters for a noisy input |
//! | [`WiegandDecoder`] | [`WiegandReader`] | Bit frames from a two-line Wiegand reader |
//!
//! The state machines take explicit timestamps and never touch a clock,
//! timer or GPIO line, which keeps them deterministic under test. The
//! drivers own the line registrations and serialize every edge, timer and
//! query through one mutex per instance.
//!
//! # Example
//!
//! ```
//! use edgeio_core::{NoiseCode, Timestamp, WiegandLine, WiegandTiming};
//! use edgeio_decoder::WiegandDecoder;
//!
//! let mut decoder = WiegandDecoder::new(WiegandTiming::default());
//! decoder.enable();
//!
//! let t = Timestamp::from_micros;
//! decoder.on_edge(WiegandLine::D0, true, t(0));
//! decoder.on_edge(WiegandLine::D0, false, t(50));
//! decoder.on_edge(WiegandLine::D1, true, t(1_300));
//! decoder.on_edge(WiegandLine::D1, false, t(1_360));
//!
//! let frame = decoder.read_frame(t(4_100)).unwrap();
//! assert_eq!((frame.timestamp, frame.bit_count, frame.data), (t(1_300), 2, 0b01));
//! assert_eq!(decoder.take_noise(), NoiseCode::None);
//! ```

pub mod debounce;
pub mod input;
pub mod reader;
pub mod wiegand;

pub use debounce::DebounceState;
pub use input::DebouncedInput;
pub use reader::WiegandReader;
pub use wiegand::{EdgeOutcome, WiegandDecoder};
