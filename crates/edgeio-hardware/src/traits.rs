//! Collaborator interfaces consumed by the edge decoders.
//!
//! This module defines the narrow contract between the decoders and the
//! platform: a GPIO controller that hands out lines and delivers edge
//! interrupts, a monotonic clock, and a one-shot timer facility. Production
//! code plugs in a real controller, [`MonotonicClock`](crate::clock::MonotonicClock)
//! and [`TokioScheduler`](crate::timer::TokioScheduler); tests plug in the
//! [`mock`](crate::mock) implementations.
//!
//! Unlike the rest of the workspace these traits are synchronous: edge
//! handlers run in interrupt context and must never await.

use crate::error::Result;
use edgeio_core::{Level, LineId, Timestamp};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Edge interrupt delivered by a GPIO controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Line that fired.
    pub line: LineId,

    /// Level sampled by the controller when the interrupt was taken.
    pub level: Level,

    /// Monotonic time of the interrupt.
    pub timestamp: Timestamp,
}

/// Which transitions raise an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTrigger {
    Rising,
    Falling,
    Both,
}

impl EdgeTrigger {
    /// Whether a transition to `level` matches this trigger.
    pub fn matches(self, level: Level) -> bool {
        match self {
            EdgeTrigger::Rising => level == Level::High,
            EdgeTrigger::Falling => level == Level::Low,
            EdgeTrigger::Both => true,
        }
    }
}

/// Requested direction of a claimed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDirection {
    Input,
    Output,
}

/// Callback invoked for every matching edge.
///
/// Runs in interrupt context: it must not block and must finish in bounded
/// time.
pub type EdgeHandler = Arc<dyn Fn(EdgeEvent) + Send + Sync>;

/// Advisory ownership token identifying a line consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerToken(u64);

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

impl OwnerToken {
    /// Allocate a process-unique token.
    pub fn next() -> Self {
        OwnerToken(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw token value (for controllers that persist ownership).
    pub const fn from_raw(raw: u64) -> Self {
        OwnerToken(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// Registration of an edge interrupt handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterruptHandle {
    line: LineId,
    id: u64,
}

impl InterruptHandle {
    pub const fn new(line: LineId, id: u64) -> Self {
        Self { line, id }
    }

    pub const fn line(&self) -> LineId {
        self.line
    }

    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// GPIO and edge-interrupt subsystem.
///
/// Line ownership is advisory: a consumer claims a line with its
/// [`OwnerToken`] and every other consumer must check [`owner`](Self::owner)
/// or handle [`HardwareError::LineBusy`](crate::HardwareError::LineBusy)
/// before using it.
pub trait GpioController: Send + Sync {
    /// Current owner of a line, if claimed.
    fn owner(&self, line: LineId) -> Option<OwnerToken>;

    /// Claim a line and configure its direction.
    ///
    /// Claiming a line already held by the same owner reconfigures it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The line is owned by another consumer (`LineBusy`)
    /// - The line does not exist or cannot be configured
    fn claim(&self, line: LineId, owner: OwnerToken, direction: LineDirection) -> Result<()>;

    /// Release a line. No-op unless `owner` holds it.
    fn release(&self, line: LineId, owner: OwnerToken);

    /// Configure the controller's own debounce filter (0 disables it).
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` if the controller has no debounce filter.
    fn set_debounce(&self, line: LineId, micros: u64) -> Result<()>;

    /// Sample the instantaneous level of a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist.
    fn read_level(&self, line: LineId) -> Result<Level>;

    /// Register `handler` for edges on `line`.
    ///
    /// # Errors
    ///
    /// Returns `InterruptRegistration` if the interrupt cannot be requested.
    fn register_edge_interrupt(
        &self,
        line: LineId,
        trigger: EdgeTrigger,
        handler: EdgeHandler,
    ) -> Result<InterruptHandle>;

    /// Remove a handler. Once this returns the handler is never invoked again.
    fn unregister_edge_interrupt(&self, handle: InterruptHandle);
}

/// Monotonic microsecond clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Work executed when a one-shot timer expires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Identifier of a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub const fn new(id: u64) -> Self {
        TimerHandle(id)
    }

    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// One-shot timer facility.
pub trait OneShotScheduler: Send + Sync {
    /// Run `task` once after `after` has elapsed.
    fn schedule(&self, after: Duration, task: TimerTask) -> TimerHandle;

    /// Cancel a pending timer. Cancelling an expired or unknown timer is a no-op.
    fn cancel(&self, handle: TimerHandle);
}
