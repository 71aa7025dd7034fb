//! Recorded edge traces.
//!
//! A trace is a JSON array of steps, each stamped with the time it happens:
//!
//! ```json
//! [
//!   { "at_us": 0,    "store": { "path": "wiegand/enabled", "value": "1" } },
//!   { "at_us": 1000, "edge":  { "line": 4, "level": "low" } },
//!   { "at_us": 1050, "edge":  { "line": 4, "level": "high" } },
//!   { "at_us": 9000, "show":  "wiegand/data" }
//! ]
//! ```

use anyhow::{Context, Result, ensure};
use edgeio_core::{Level, LineId};
use serde::Deserialize;
use std::path::Path;

/// What a step does.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Drive a line to a level.
    Edge { line: LineId, level: Level },

    /// Write an attribute.
    Store { path: String, value: String },

    /// Read an attribute.
    Show(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    /// Absolute time of the step in microseconds.
    pub at_us: u64,

    #[serde(flatten)]
    pub action: Action,
}

/// Parse a trace and check its steps are in time order.
pub fn parse(json: &str) -> Result<Vec<Step>> {
    let steps: Vec<Step> = serde_json::from_str(json).context("malformed trace")?;
    for pair in steps.windows(2) {
        ensure!(
            pair[0].at_us <= pair[1].at_us,
            "trace step at {}us comes after step at {}us",
            pair[1].at_us,
            pair[0].at_us
        );
    }
    Ok(steps)
}

pub fn load(path: &Path) -> Result<Vec<Step>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace {}", path.display()))?;
    parse(&json)
}
