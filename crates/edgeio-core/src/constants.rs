//! Timing defaults and protocol constants for the edge decoders.
//!
//! All durations are expressed in microseconds unless the constant name says
//! otherwise. The defaults match the values shipped with the board's kernel
//! driver and are what [`crate::config`] falls back to when a configuration
//! section is omitted.
//!
//! # Usage
//!
//! ```
//! use edgeio_core::constants::*;
//!
//! assert!(DEFAULT_PULSE_WIDTH_MIN_US < DEFAULT_PULSE_WIDTH_MAX_US);
//! assert!(DEFAULT_PULSE_INTERVAL_MIN_US < DEFAULT_PULSE_INTERVAL_MAX_US);
//! assert_eq!(DEFAULT_DEBOUNCE_US / 1000, 50);
//! ```

// ============================================================================
// Debounce
// ============================================================================

/// Default minimum time a raw level must be held before it is confirmed.
///
/// Applies to both the on (high) and off (low) thresholds.
pub const DEFAULT_DEBOUNCE_US: u64 = 50_000;

/// Raw encoding of an unconfirmed debounced value.
pub const DEBOUNCE_UNKNOWN_RAW: i8 = -1;

// ============================================================================
// Wiegand
// ============================================================================

/// Maximum number of bits accumulated into a single Wiegand frame.
///
/// Further bits are dropped until the frame times out.
pub const WIEGAND_MAX_BITS: u32 = 64;

/// Default shortest accepted pulse (line asserted low).
pub const DEFAULT_PULSE_WIDTH_MIN_US: u64 = 10;

/// Default longest accepted pulse.
pub const DEFAULT_PULSE_WIDTH_MAX_US: u64 = 150;

/// Default shortest accepted time between the starts of two pulses.
pub const DEFAULT_PULSE_INTERVAL_MIN_US: u64 = 1_200;

/// Default longest time between the starts of two pulses of the same frame.
///
/// Silence longer than this finalizes the frame.
pub const DEFAULT_PULSE_INTERVAL_MAX_US: u64 = 2_700;

// ============================================================================
// Attribute devices
// ============================================================================

/// Device name used for digital inputs when a configuration omits one.
pub const DEFAULT_INPUT_DEVICE: &str = "digital_in";

/// Device name used for Wiegand readers when a configuration omits one.
pub const DEFAULT_WIEGAND_DEVICE: &str = "wiegand";

/// Device grouping the alternate-mode TTL ports.
pub const TTL_DEVICE: &str = "digital_io";
