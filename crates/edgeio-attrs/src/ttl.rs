//! Alternate-mode TTL ports.
//!
//! A TTL port shares its line with other functions (typically a Wiegand
//! reader). Selecting a mode claims the line with the port's own owner
//! token, so whichever function claims first wins and the other gets
//! `Busy`.

use edgeio_core::{Error, LineId, Result, TtlPortConfig};
use edgeio_hardware::{GpioController, HardwareError, LineDirection, OwnerToken};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Mode of a TTL port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TtlMode {
    /// Line not claimed.
    #[default]
    Disabled,
    Input,
    Output,
}

impl TtlMode {
    /// Parse a stored mode. Only the first character counts: `i` selects
    /// input, `o` output, anything else disables the port.
    pub fn parse(value: &str) -> Self {
        match value.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('I') => TtlMode::Input,
            Some('O') => TtlMode::Output,
            _ => TtlMode::Disabled,
        }
    }

    fn direction(self) -> Option<LineDirection> {
        match self {
            TtlMode::Disabled => None,
            TtlMode::Input => Some(LineDirection::Input),
            TtlMode::Output => Some(LineDirection::Output),
        }
    }
}

impl fmt::Display for TtlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtlMode::Disabled => write!(f, "x"),
            TtlMode::Input => write!(f, "in"),
            TtlMode::Output => write!(f, "out"),
        }
    }
}

/// A line usable as a plain input or output when no other function holds it.
pub struct TtlPort {
    name: String,
    line: LineId,
    owner: OwnerToken,
    gpio: Arc<dyn GpioController>,
    mode: Mutex<TtlMode>,
}

impl TtlPort {
    /// Create a disabled port.
    pub fn new(config: &TtlPortConfig, gpio: Arc<dyn GpioController>) -> Self {
        Self {
            name: config.name.clone(),
            line: config.line,
            owner: OwnerToken::next(),
            gpio,
            mode: Mutex::new(TtlMode::Disabled),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TtlMode> {
        self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    pub fn mode(&self) -> TtlMode {
        *self.lock()
    }

    /// Switch mode, claiming or releasing the line.
    ///
    /// # Errors
    /// - `Busy` if the line is owned by another function; the port keeps
    ///   its current mode
    /// - `ResourceUnavailable` if the line cannot be configured; the port
    ///   is left disabled
    pub fn set_mode(&self, mode: TtlMode) -> Result<()> {
        let mut current = self.lock();

        let Some(direction) = mode.direction() else {
            self.gpio.release(self.line, self.owner);
            *current = TtlMode::Disabled;
            info!(port = %self.name, line = %self.line, "TTL port disabled");
            return Ok(());
        };

        match self.gpio.claim(self.line, self.owner, direction) {
            Ok(()) => {
                *current = mode;
                info!(port = %self.name, line = %self.line, mode = %mode, "TTL port configured");
                Ok(())
            }
            Err(e @ HardwareError::LineBusy { .. }) => Err(Error::from(e)),
            Err(e) => {
                warn!(port = %self.name, line = %self.line, error = %e, "TTL port setup failed");
                self.gpio.release(self.line, self.owner);
                *current = TtlMode::Disabled;
                Err(e.into())
            }
        }
    }
}

impl fmt::Debug for TtlPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlPort")
            .field("name", &self.name)
            .field("line", &self.line)
            .field("mode", &self.mode())
            .finish()
    }
}

impl Drop for TtlPort {
    fn drop(&mut self) {
        self.gpio.release(self.line, self.owner);
    }
}
