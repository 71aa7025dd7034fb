//! Board configuration.
//!
//! Describes which lines are monitored by debounced inputs, which line pairs
//! form Wiegand readers and which lines are exposed as alternate-mode TTL
//! ports. Configurations are loaded from JSON; every timing section may be
//! omitted and falls back to the defaults in [`crate::constants`].
//!
//! ```
//! use edgeio_core::config::BoardConfig;
//!
//! let config = BoardConfig::from_json_str(r#"{
//!     "inputs": [{ "name": "di1", "line": 16 }],
//!     "wiegand": [{ "name": "wiegand", "d0": 4, "d1": 5 }]
//! }"#).unwrap();
//!
//! assert_eq!(config.inputs[0].debounce.on_min_us, 50_000);
//! assert_eq!(config.wiegand[0].timing.pulse_interval_max_us, 2_700);
//! ```

use crate::constants::{
    DEFAULT_DEBOUNCE_US, DEFAULT_INPUT_DEVICE, DEFAULT_PULSE_INTERVAL_MAX_US,
    DEFAULT_PULSE_INTERVAL_MIN_US, DEFAULT_PULSE_WIDTH_MAX_US, DEFAULT_PULSE_WIDTH_MIN_US,
    DEFAULT_WIEGAND_DEVICE, TTL_DEVICE,
};
use crate::{Error, LineId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Minimum hold times of a debounced input, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Time a high level must be held before it is confirmed.
    pub on_min_us: u64,

    /// Time a low level must be held before it is confirmed.
    pub off_min_us: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            on_min_us: DEFAULT_DEBOUNCE_US,
            off_min_us: DEFAULT_DEBOUNCE_US,
        }
    }
}

/// Timing windows of a Wiegand reader, in microseconds.
///
/// Pairs are not checked for `min <= max`; an inverted pair makes every
/// pulse fail the corresponding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiegandTiming {
    pub pulse_width_min_us: u64,
    pub pulse_width_max_us: u64,
    pub pulse_interval_min_us: u64,
    pub pulse_interval_max_us: u64,
}

impl Default for WiegandTiming {
    fn default() -> Self {
        Self {
            pulse_width_min_us: DEFAULT_PULSE_WIDTH_MIN_US,
            pulse_width_max_us: DEFAULT_PULSE_WIDTH_MAX_US,
            pulse_interval_min_us: DEFAULT_PULSE_INTERVAL_MIN_US,
            pulse_interval_max_us: DEFAULT_PULSE_INTERVAL_MAX_US,
        }
    }
}

fn default_input_device() -> String {
    DEFAULT_INPUT_DEVICE.to_string()
}

fn default_wiegand_device() -> String {
    DEFAULT_WIEGAND_DEVICE.to_string()
}

/// A digital input filtered by the debounce engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalInputConfig {
    /// Attribute device the input is listed under (e.g. `digital_in`, `pir`).
    #[serde(default = "default_input_device")]
    pub device: String,

    /// Input name, used as the attribute prefix (e.g. `di1`).
    pub name: String,

    pub line: LineId,

    #[serde(default)]
    pub debounce: DebounceConfig,
}

/// A Wiegand reader on a pair of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiegandReaderConfig {
    /// Attribute device name of the reader.
    #[serde(default = "default_wiegand_device")]
    pub name: String,

    pub d0: LineId,

    pub d1: LineId,

    #[serde(default)]
    pub timing: WiegandTiming,
}

/// A line that can be claimed as a plain input or output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlPortConfig {
    pub name: String,

    pub line: LineId,
}

/// Complete board description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub inputs: Vec<DigitalInputConfig>,
    pub wiegand: Vec<WiegandReaderConfig>,
    pub ttl_ports: Vec<TtlPortConfig>,
}

impl BoardConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns `Error::Json` for malformed JSON and `Error::Config` when
    /// [`validate`](Self::validate) fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: BoardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` when the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check structural consistency.
    ///
    /// Rejects duplicate attribute names, a reader using the same line for
    /// D0 and D1, and a line monitored by more than one debounced input.
    /// Lines shared between a reader and a TTL port are allowed: ownership
    /// is arbitrated at runtime.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let mut paths = HashSet::new();
        let mut input_lines = HashSet::new();

        for input in &self.inputs {
            if input.name.is_empty() || input.device.is_empty() {
                return Err(Error::config("Input name and device must not be empty"));
            }
            if !paths.insert(format!("{}/{}", input.device, input.name)) {
                return Err(Error::config(format!(
                    "Duplicate input {}/{}",
                    input.device, input.name
                )));
            }
            if !input_lines.insert(input.line) {
                return Err(Error::config(format!(
                    "Line {} is monitored by more than one input",
                    input.line
                )));
            }
        }

        let mut devices: HashSet<&str> = self.inputs.iter().map(|i| i.device.as_str()).collect();
        devices.insert(TTL_DEVICE);

        for reader in &self.wiegand {
            if reader.name.is_empty() {
                return Err(Error::config("Wiegand reader name must not be empty"));
            }
            if reader.d0 == reader.d1 {
                return Err(Error::config(format!(
                    "Wiegand reader {} uses {} for both D0 and D1",
                    reader.name, reader.d0
                )));
            }
            if !devices.insert(reader.name.as_str()) {
                return Err(Error::config(format!(
                    "Wiegand reader name {} collides with another device",
                    reader.name
                )));
            }
        }

        let mut ttl_names = HashSet::new();
        for port in &self.ttl_ports {
            if port.name.is_empty() || !ttl_names.insert(port.name.as_str()) {
                return Err(Error::config(format!(
                    "Invalid or duplicate TTL port name '{}'",
                    port.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_applied() {
        let config = BoardConfig::from_json_str(
            r#"{
                "inputs": [{ "name": "di1", "line": 16 }],
                "wiegand": [{ "name": "wiegand", "d0": 4, "d1": 5 }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.inputs[0].device, "digital_in");
        assert_eq!(config.inputs[0].debounce, DebounceConfig::default());
        assert_eq!(config.wiegand[0].timing, WiegandTiming::default());
        assert!(config.ttl_ports.is_empty());
    }

    #[test]
    fn test_partial_timing_override() {
        let config = BoardConfig::from_json_str(
            r#"{
                "wiegand": [{
                    "name": "w1", "d0": 4, "d1": 5,
                    "timing": { "pulse_interval_max_us": 25000 }
                }]
            }"#,
        )
        .unwrap();

        let timing = config.wiegand[0].timing;
        assert_eq!(timing.pulse_interval_max_us, 25_000);
        assert_eq!(timing.pulse_width_min_us, 10);
        assert_eq!(timing.pulse_width_max_us, 150);
        assert_eq!(timing.pulse_interval_min_us, 1_200);
    }

    #[test]
    fn test_inverted_thresholds_accepted() {
        let config = BoardConfig::from_json_str(
            r#"{
                "wiegand": [{
                    "name": "w1", "d0": 4, "d1": 5,
                    "timing": { "pulse_width_min_us": 500, "pulse_width_max_us": 100 }
                }]
            }"#,
        );
        assert!(config.is_ok());
    }

    #[test]
    fn test_reader_name_defaults_to_wiegand() {
        let config = BoardConfig::from_json_str(r#"{ "wiegand": [{ "d0": 4, "d1": 5 }] }"#).unwrap();
        assert_eq!(config.wiegand[0].name, "wiegand");

        // A second unnamed reader collides with the first.
        let result = BoardConfig::from_json_str(
            r#"{ "wiegand": [{ "d0": 4, "d1": 5 }, { "d0": 6, "d1": 7 }] }"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_reader_same_line_rejected() {
        let result =
            BoardConfig::from_json_str(r#"{ "wiegand": [{ "name": "w1", "d0": 4, "d1": 4 }] }"#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_duplicate_input_rejected() {
        let result = BoardConfig::from_json_str(
            r#"{ "inputs": [
                { "name": "di1", "line": 16 },
                { "name": "di1", "line": 17 }
            ] }"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_shared_input_line_rejected() {
        let result = BoardConfig::from_json_str(
            r#"{ "inputs": [
                { "name": "di1", "line": 16 },
                { "device": "pir", "name": "motion", "line": 16 }
            ] }"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_reader_name_collision_rejected() {
        let result = BoardConfig::from_json_str(
            r#"{
                "inputs": [{ "name": "di1", "line": 16 }],
                "wiegand": [{ "name": "digital_in", "d0": 4, "d1": 5 }]
            }"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = BoardConfig::from_json_str("{ inputs: ");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "ttl_ports": [{{ "name": "ttl1", "line": 4 }}] }}"#
        )
        .unwrap();

        let config = BoardConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.ttl_ports[0].line, LineId::new(4));
    }

    #[test]
    fn test_missing_file() {
        let result = BoardConfig::from_json_file("/nonexistent/board.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
