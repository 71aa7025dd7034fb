//! Error types for GPIO controller operations.
//!
//! [`HardwareError`] describes what went wrong talking to the GPIO and
//! interrupt subsystem. Decoders surface these to their callers through
//! [`edgeio_core::Error`]: a line owned by another consumer becomes
//! `Busy`, every other acquisition failure becomes `ResourceUnavailable`.

use crate::traits::OwnerToken;
use edgeio_core::LineId;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during GPIO controller operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Line is already claimed by another consumer.
    #[error("Line {line} is owned by {owner}")]
    LineBusy { line: LineId, owner: OwnerToken },

    /// Line does not exist or could not be requested.
    #[error("Line {line} unavailable: {message}")]
    LineUnavailable { line: LineId, message: String },

    /// Edge interrupt could not be registered.
    #[error("Interrupt registration failed on line {line}: {message}")]
    InterruptRegistration { line: LineId, message: String },

    /// Operation is not supported by this controller.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new line busy error.
    pub fn line_busy(line: LineId, owner: OwnerToken) -> Self {
        Self::LineBusy { line, owner }
    }

    /// Create a new line unavailable error.
    pub fn line_unavailable(line: LineId, message: impl Into<String>) -> Self {
        Self::LineUnavailable {
            line,
            message: message.into(),
        }
    }

    /// Create a new interrupt registration error.
    pub fn interrupt(line: LineId, message: impl Into<String>) -> Self {
        Self::InterruptRegistration {
            line,
            message: message.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }
}

impl From<HardwareError> for edgeio_core::Error {
    fn from(error: HardwareError) -> Self {
        match error {
            HardwareError::LineBusy { .. } => edgeio_core::Error::Busy(error.to_string()),
            HardwareError::Io(io) => edgeio_core::Error::Io(io),
            other => edgeio_core::Error::ResourceUnavailable(other.to_string()),
        }
    }
}
