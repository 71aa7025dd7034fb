//! Platform collaborators for the edge decoders.
//!
//! The decoders in `edgeio-decoder` never touch hardware directly. They
//! consume three narrow interfaces defined in [`traits`]:
//!
//! - [`GpioController`]: line ownership, levels and edge interrupts
//! - [`Clock`]: a monotonic microsecond clock
//! - [`OneShotScheduler`]: cancellable one-shot timers
//!
//! Production wiring uses [`MonotonicClock`] and [`TokioScheduler`] together
//! with a platform GPIO controller. The [`mock`] module provides a
//! deterministic controller, clock and scheduler for tests and trace replay.
//!
//! # Example
//!
//! ```
//! use edgeio_core::{Level, LineId};
//! use edgeio_hardware::mock::MockGpio;
//! use edgeio_hardware::{GpioController, LineDirection, OwnerToken};
//!
//! let gpio = MockGpio::with_lines([LineId::new(4), LineId::new(5)]);
//! let owner = OwnerToken::next();
//!
//! gpio.claim(LineId::new(4), owner, LineDirection::Input).unwrap();
//! assert_eq!(gpio.read_level(LineId::new(4)).unwrap(), Level::High);
//! assert!(gpio.claim(LineId::new(4), OwnerToken::next(), LineDirection::Output).is_err());
//! ```
//!
//! # Error Handling
//!
//! Operations return [`Result<T>`][error::Result] with [`HardwareError`],
//! which converts into [`edgeio_core::Error`] at the decoder boundary.

pub mod clock;
pub mod error;
pub mod mock;
pub mod timer;
pub mod traits;

// Re-export commonly used types for convenience
pub use clock::MonotonicClock;
pub use error::{HardwareError, Result};
pub use timer::TokioScheduler;
pub use traits::{
    Clock, EdgeEvent, EdgeHandler, EdgeTrigger, GpioController, InterruptHandle, LineDirection,
    OneShotScheduler, OwnerToken, TimerHandle, TimerTask,
};
