//! Debounced digital input bound to a GPIO line.

use crate::debounce::DebounceState;
use edgeio_core::{DebounceConfig, DebouncedValue, LineId, Result, Timestamp};
use edgeio_hardware::{
    Clock, EdgeEvent, EdgeHandler, EdgeTrigger, GpioController, InterruptHandle, LineDirection,
    OwnerToken,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace};

type SharedState = Arc<Mutex<DebounceState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, DebounceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A monitored input line with its debounce state.
///
/// The line is claimed and its edge interrupt registered for the lifetime of
/// the value; dropping it unregisters the interrupt and releases the line.
///
/// # Examples
///
/// ```
/// use edgeio_core::{DebounceConfig, DebouncedValue, Level, LineId, Timestamp};
/// use edgeio_decoder::DebouncedInput;
/// use edgeio_hardware::mock::{MockClock, MockGpio};
/// use std::sync::Arc;
///
/// let line = LineId::new(16);
/// let gpio = MockGpio::with_lines([line]);
/// let clock = MockClock::new();
///
/// let input = DebouncedInput::register(
///     "di1",
///     line,
///     &DebounceConfig::default(),
///     Arc::new(gpio.clone()),
///     Arc::new(clock.clone()),
/// ).unwrap();
///
/// clock.set(60_000);
/// assert_eq!(input.value(), DebouncedValue::High);
///
/// gpio.set_level(line, Level::Low, Timestamp::from_micros(60_000)).unwrap();
/// clock.set(200_000);
/// assert_eq!(input.value(), DebouncedValue::Low);
/// assert_eq!(input.off_count(), 1);
/// ```
pub struct DebouncedInput {
    name: String,
    line: LineId,
    owner: OwnerToken,
    gpio: Arc<dyn GpioController>,
    clock: Arc<dyn Clock>,
    state: SharedState,
    interrupt: InterruptHandle,
}

impl DebouncedInput {
    /// Claim `line`, sample its level and start debouncing it.
    ///
    /// # Errors
    /// - `Busy` if the line is owned by another consumer
    /// - `ResourceUnavailable` if the line cannot be read or its interrupt
    ///   cannot be registered; the line is released again in that case
    pub fn register(
        name: impl Into<String>,
        line: LineId,
        config: &DebounceConfig,
        gpio: Arc<dyn GpioController>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let name = name.into();
        let owner = OwnerToken::next();

        gpio.claim(line, owner, LineDirection::Input)?;

        let initial = match gpio.read_level(line) {
            Ok(level) => level,
            Err(e) => {
                gpio.release(line, owner);
                return Err(e.into());
            }
        };

        let state = Arc::new(Mutex::new(DebounceState::new(initial, clock.now(), config)));
        let handler = edge_handler(name.clone(), Arc::clone(&state));

        let interrupt = match gpio.register_edge_interrupt(line, EdgeTrigger::Both, handler) {
            Ok(handle) => handle,
            Err(e) => {
                gpio.release(line, owner);
                return Err(e.into());
            }
        };

        info!(input = %name, line = %line, level = %initial, "Debounced input registered");

        Ok(Self {
            name,
            line,
            owner,
            gpio,
            clock,
            state,
            interrupt,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    /// Debounced value now.
    pub fn value(&self) -> DebouncedValue {
        self.value_at(self.clock.now())
    }

    /// Debounced value at `now`.
    pub fn value_at(&self, now: Timestamp) -> DebouncedValue {
        lock(&self.state).read(now)
    }

    /// Confirmed high transitions.
    pub fn on_count(&self) -> u64 {
        lock(&self.state).on_count(self.clock.now())
    }

    /// Confirmed low transitions.
    pub fn off_count(&self) -> u64 {
        lock(&self.state).off_count(self.clock.now())
    }

    pub fn on_min_us(&self) -> u64 {
        lock(&self.state).on_min_us()
    }

    pub fn off_min_us(&self) -> u64 {
        lock(&self.state).off_min_us()
    }

    /// Set the high hold time. Resets both counters and the value.
    pub fn set_on_min_us(&self, micros: u64) {
        lock(&self.state).set_on_min_us(micros);
        debug!(input = %self.name, on_min_us = micros, "Debounce threshold changed");
    }

    /// Set the low hold time. Resets both counters and the value.
    pub fn set_off_min_us(&self, micros: u64) {
        lock(&self.state).set_off_min_us(micros);
        debug!(input = %self.name, off_min_us = micros, "Debounce threshold changed");
    }
}

fn edge_handler(name: String, state: SharedState) -> EdgeHandler {
    Arc::new(move |event: EdgeEvent| {
        let confirmed = lock(&state).on_edge(event.level, event.timestamp);
        if let Some(value) = confirmed {
            trace!(input = %name, value = %value, at = %event.timestamp, "Debounced level confirmed");
        }
    })
}

impl fmt::Debug for DebouncedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedInput")
            .field("name", &self.name)
            .field("line", &self.line)
            .field("state", &*lock(&self.state))
            .finish()
    }
}

impl Drop for DebouncedInput {
    fn drop(&mut self) {
        self.gpio.unregister_edge_interrupt(self.interrupt);
        self.gpio.release(self.line, self.owner);
        debug!(input = %self.name, line = %self.line, "Debounced input released");
    }
}
