//! Mock collaborators for testing and trace replay.
//!
//! These implementations are fully deterministic: edges fire only when a
//! test drives a line, time advances only when a test moves the clock, and
//! timers expire only when a test runs them.

pub mod clock;
pub mod gpio;
pub mod timer;

pub use clock::MockClock;
pub use gpio::MockGpio;
pub use timer::MockScheduler;
