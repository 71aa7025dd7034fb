use crate::{Result, constants::DEBOUNCE_UNKNOWN_RAW, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic timestamp with microsecond resolution.
///
/// Timestamps only ever come from a monotonic source, but elapsed-time
/// arithmetic saturates at zero so an out-of-order pair can never wrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The origin of the monotonic clock.
    pub const ZERO: Timestamp = Timestamp(0);

    /// Create a timestamp from microseconds since the clock origin.
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Microseconds since the clock origin.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Microseconds elapsed from `earlier` to `self`, saturating at zero.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Timestamp `micros` later than `self`.
    #[must_use]
    pub const fn saturating_add_micros(self, micros: u64) -> Self {
        Timestamp(self.0.saturating_add(micros))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instantaneous electrical level of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Convert a raw line value (0 = low, anything else = high).
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        if raw == 0 { Level::Low } else { Level::High }
    }

    /// Raw line value (0 or 1).
    #[must_use]
    pub fn as_raw(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    #[must_use]
    pub fn is_low(self) -> bool {
        self == Level::Low
    }

    /// The opposite level.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "low" => Ok(Level::Low),
            "1" | "high" => Ok(Level::High),
            other => Err(Error::invalid_argument(format!("Invalid level: {other}"))),
        }
    }
}

/// Stabilized logical value produced by the debounce engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebouncedValue {
    /// No level has been held long enough since registration or reconfiguration.
    #[default]
    Unknown,
    Low,
    High,
}

impl DebouncedValue {
    /// Raw encoding: -1 unknown, 0 low, 1 high.
    #[must_use]
    pub fn as_raw(self) -> i8 {
        match self {
            DebouncedValue::Unknown => DEBOUNCE_UNKNOWN_RAW,
            DebouncedValue::Low => 0,
            DebouncedValue::High => 1,
        }
    }

    /// The confirmed level, if any.
    #[must_use]
    pub fn level(self) -> Option<Level> {
        match self {
            DebouncedValue::Unknown => None,
            DebouncedValue::Low => Some(Level::Low),
            DebouncedValue::High => Some(Level::High),
        }
    }
}

impl From<Level> for DebouncedValue {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => DebouncedValue::Low,
            Level::High => DebouncedValue::High,
        }
    }
}

impl fmt::Display for DebouncedValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

/// Identifier of a physical GPIO line (controller line offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(u32);

impl LineId {
    #[must_use]
    pub const fn new(offset: u32) -> Self {
        LineId(offset)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

impl std::str::FromStr for LineId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("gpio").unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map(LineId)
            .map_err(|_| Error::invalid_argument(format!("Invalid line: {s}")))
    }
}

/// One of the two data lines of a Wiegand reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WiegandLine {
    /// Pulses on D0 encode a 0 bit.
    D0,
    /// Pulses on D1 encode a 1 bit.
    D1,
}

impl WiegandLine {
    /// Both lines, in index order.
    pub const ALL: [WiegandLine; 2] = [WiegandLine::D0, WiegandLine::D1];

    /// Bit value encoded by a pulse on this line.
    #[must_use]
    pub fn bit(self) -> u64 {
        match self {
            WiegandLine::D0 => 0,
            WiegandLine::D1 => 1,
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            WiegandLine::D0 => 0,
            WiegandLine::D1 => 1,
        }
    }
}

impl fmt::Display for WiegandLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WiegandLine::D0 => write!(f, "D0"),
            WiegandLine::D1 => write!(f, "D1"),
        }
    }
}

/// Classification of the last timing violation seen by a Wiegand reader.
///
/// The numeric codes are part of the attribute contract and must not change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NoiseCode {
    #[default]
    None = 0,
    /// Interrupt fired without the line changing level.
    DuplicateEdge = 10,
    /// Pulse started sooner than the minimum interval after the previous one.
    PulseTooEarly = 11,
    /// Both lines asserted at the same time.
    BothLinesActive = 12,
    /// A line was released that was not the active one.
    UnexpectedDeassert = 13,
    PulseTooShort = 14,
    PulseTooLong = 15,
}

impl NoiseCode {
    /// Numeric code (0 when no noise is pending).
    #[must_use]
    pub fn as_code(self) -> u8 {
        self as u8
    }

    /// Parse a numeric code.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` for codes outside the taxonomy.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(NoiseCode::None),
            10 => Ok(NoiseCode::DuplicateEdge),
            11 => Ok(NoiseCode::PulseTooEarly),
            12 => Ok(NoiseCode::BothLinesActive),
            13 => Ok(NoiseCode::UnexpectedDeassert),
            14 => Ok(NoiseCode::PulseTooShort),
            15 => Ok(NoiseCode::PulseTooLong),
            other => Err(Error::invalid_argument(format!("Unknown noise code: {other}"))),
        }
    }

    #[must_use]
    pub fn is_noise(self) -> bool {
        self != NoiseCode::None
    }
}

impl fmt::Display for NoiseCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

/// Snapshot of a finalized Wiegand frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WiegandFrame {
    /// Start of the last accepted pulse.
    pub timestamp: Timestamp,
    pub bit_count: u32,
    /// Bits in arrival order, first bit most significant.
    pub data: u64,
}

impl fmt::Display for WiegandFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.timestamp, self.bit_count, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_timestamp_elapsed_saturates() {
        let early = Timestamp::from_micros(100);
        let late = Timestamp::from_micros(350);
        assert_eq!(late.elapsed_since(early), 250);
        assert_eq!(early.elapsed_since(late), 0);
        assert_eq!(early.saturating_add_micros(50), Timestamp::from_micros(150));
        assert_eq!(
            Timestamp::from_micros(u64::MAX).saturating_add_micros(1),
            Timestamp::from_micros(u64::MAX)
        );
    }

    #[rstest]
    #[case("0", Level::Low)]
    #[case("1", Level::High)]
    #[case("low", Level::Low)]
    #[case(" HIGH\n", Level::High)]
    fn test_level_parse(#[case] input: &str, #[case] expected: Level) {
        let level: Level = input.parse().unwrap();
        assert_eq!(level, expected);
    }

    #[rstest]
    #[case("2")]
    #[case("")]
    #[case("on")]
    fn test_level_parse_invalid(#[case] input: &str) {
        let result: Result<Level> = input.parse();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_level_raw() {
        assert_eq!(Level::from_raw(0), Level::Low);
        assert_eq!(Level::from_raw(7), Level::High);
        assert_eq!(Level::High.as_raw(), 1);
        assert_eq!(Level::Low.toggled(), Level::High);
        assert!(Level::Low.is_low());
    }

    #[test]
    fn test_debounced_value_encoding() {
        assert_eq!(DebouncedValue::Unknown.as_raw(), -1);
        assert_eq!(DebouncedValue::Low.as_raw(), 0);
        assert_eq!(DebouncedValue::High.as_raw(), 1);
        assert_eq!(DebouncedValue::Unknown.to_string(), "-1");
        assert_eq!(DebouncedValue::from(Level::High), DebouncedValue::High);
        assert_eq!(DebouncedValue::Unknown.level(), None);
        assert_eq!(DebouncedValue::Low.level(), Some(Level::Low));
    }

    #[rstest]
    #[case("17", 17)]
    #[case("gpio5", 5)]
    #[case(" 26 ", 26)]
    fn test_line_id_parse(#[case] input: &str, #[case] expected: u32) {
        let line: LineId = input.parse().unwrap();
        assert_eq!(line.as_u32(), expected);
    }

    #[test]
    fn test_line_id_invalid() {
        assert!("gpio".parse::<LineId>().is_err());
        assert!("-1".parse::<LineId>().is_err());
        assert_eq!(LineId::new(4).to_string(), "gpio4");
    }

    #[test]
    fn test_wiegand_line_bits() {
        assert_eq!(WiegandLine::D0.bit(), 0);
        assert_eq!(WiegandLine::D1.bit(), 1);
        assert_eq!(WiegandLine::ALL.map(WiegandLine::index), [0, 1]);
    }

    #[rstest]
    #[case(NoiseCode::None, 0)]
    #[case(NoiseCode::DuplicateEdge, 10)]
    #[case(NoiseCode::PulseTooEarly, 11)]
    #[case(NoiseCode::BothLinesActive, 12)]
    #[case(NoiseCode::UnexpectedDeassert, 13)]
    #[case(NoiseCode::PulseTooShort, 14)]
    #[case(NoiseCode::PulseTooLong, 15)]
    fn test_noise_codes(#[case] noise: NoiseCode, #[case] code: u8) {
        assert_eq!(noise.as_code(), code);
        assert_eq!(NoiseCode::from_code(code).unwrap(), noise);
        assert_eq!(noise.is_noise(), code != 0);
    }

    #[test]
    fn test_noise_code_unknown() {
        assert!(NoiseCode::from_code(9).is_err());
        assert!(NoiseCode::from_code(16).is_err());
    }

    #[test]
    fn test_frame_display() {
        let frame = WiegandFrame {
            timestamp: Timestamp::from_micros(1300),
            bit_count: 2,
            data: 1,
        };
        assert_eq!(frame.to_string(), "1300 2 1");
    }
}
