//! Text encoding of attribute values.

use edgeio_core::{Error, Result};
use std::fmt;

/// Whether an attribute accepts stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

impl Access {
    pub fn is_writable(self) -> bool {
        self == Access::ReadWrite
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::ReadOnly => write!(f, "r"),
            Access::ReadWrite => write!(f, "rw"),
        }
    }
}

/// Render a value as an attribute line.
pub fn format_line(value: impl fmt::Display) -> String {
    format!("{value}\n")
}

/// Parse an enable flag. Only the first character is significant.
///
/// # Errors
/// `InvalidArgument` unless the value starts with `0` or `1`.
pub fn parse_enabled(value: &str) -> Result<bool> {
    match value.chars().next() {
        Some('0') => Ok(false),
        Some('1') => Ok(true),
        _ => Err(Error::invalid_argument(format!(
            "Expected 0 or 1, got {:?}",
            value.trim_end()
        ))),
    }
}

/// Parse a decimal duration. Negative values clamp to zero.
///
/// # Errors
/// `InvalidArgument` when the trimmed value is not a decimal integer.
pub fn parse_duration(value: &str) -> Result<u64> {
    let trimmed = value.trim();
    let parsed: i64 = trimmed
        .parse()
        .map_err(|_| Error::invalid_argument(format!("Invalid number: {trimmed:?}")))?;
    Ok(u64::try_from(parsed).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", false)]
    #[case("1", true)]
    #[case("1\n", true)]
    #[case("0junk", false)]
    #[case("10", true)]
    fn test_parse_enabled(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(parse_enabled(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("2")]
    #[case(" 1")]
    #[case("yes")]
    fn test_parse_enabled_rejects(#[case] input: &str) {
        assert!(matches!(parse_enabled(input), Err(Error::InvalidArgument(_))));
    }

    #[rstest]
    #[case("2700", 2_700)]
    #[case("  150\n", 150)]
    #[case("-5", 0)]
    #[case("0", 0)]
    fn test_parse_duration(#[case] input: &str, #[case] expected: u64) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("12ms")]
    #[case("1.5")]
    #[case("99999999999999999999")]
    fn test_parse_duration_rejects(#[case] input: &str) {
        assert!(matches!(parse_duration(input), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(-1), "-1\n");
        assert_eq!(format_line("in"), "in\n");
        assert_eq!(Access::ReadWrite.to_string(), "rw");
        assert!(!Access::ReadOnly.is_writable());
    }
}
