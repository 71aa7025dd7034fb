//! Simulated GPIO controller.

use crate::error::{HardwareError, Result};
use crate::traits::{
    EdgeEvent, EdgeHandler, EdgeTrigger, GpioController, InterruptHandle, LineDirection,
    OwnerToken,
};
use edgeio_core::{Level, LineId, Timestamp};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Registration {
    id: u64,
    trigger: EdgeTrigger,
    handler: EdgeHandler,
}

struct MockLine {
    level: Level,
    owner: Option<OwnerToken>,
    direction: Option<LineDirection>,
    debounce_us: Option<u64>,
    handlers: Vec<Registration>,
}

impl MockLine {
    fn new(level: Level) -> Self {
        Self {
            level,
            owner: None,
            direction: None,
            debounce_us: None,
            handlers: Vec::new(),
        }
    }
}

#[derive(Default)]
struct GpioState {
    lines: HashMap<LineId, MockLine>,
    next_handler_id: u64,
    fail_claim: HashSet<LineId>,
    fail_interrupt: HashSet<LineId>,
    debounce_unsupported: bool,
}

impl GpioState {
    fn line(&self, line: LineId) -> Result<&MockLine> {
        self.lines
            .get(&line)
            .ok_or_else(|| HardwareError::line_unavailable(line, "no such line"))
    }

    fn line_mut(&mut self, line: LineId) -> Result<&mut MockLine> {
        self.lines
            .get_mut(&line)
            .ok_or_else(|| HardwareError::line_unavailable(line, "no such line"))
    }
}

/// In-memory GPIO controller.
///
/// Lines must be added before use. Tests drive edges with
/// [`set_level`](Self::set_level) (fires only on an actual change) or
/// [`inject_edge`](Self::inject_edge) (fires unconditionally, modelling a
/// spurious or repeated interrupt). Handlers run on the calling thread,
/// outside the controller lock. Clones share the same lines.
///
/// # Examples
///
/// ```
/// use edgeio_core::{Level, LineId, Timestamp};
/// use edgeio_hardware::mock::MockGpio;
/// use edgeio_hardware::traits::{EdgeTrigger, GpioController};
/// use std::sync::{Arc, Mutex};
///
/// let gpio = MockGpio::with_lines([LineId::new(4)]);
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&seen);
/// gpio.register_edge_interrupt(LineId::new(4), EdgeTrigger::Both, Arc::new(move |event| {
///     sink.lock().unwrap().push(event.level);
/// })).unwrap();
///
/// gpio.set_level(LineId::new(4), Level::Low, Timestamp::from_micros(10)).unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![Level::Low]);
/// ```
#[derive(Clone, Default)]
pub struct MockGpio {
    state: Arc<Mutex<GpioState>>,
}

impl MockGpio {
    /// Create a controller with no lines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller with `lines`, all idle high.
    pub fn with_lines(lines: impl IntoIterator<Item = LineId>) -> Self {
        let gpio = Self::new();
        for line in lines {
            gpio.add_line(line, Level::High);
        }
        gpio
    }

    fn lock(&self) -> MutexGuard<'_, GpioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a line (or reset an existing one) at `level`.
    pub fn add_line(&self, line: LineId, level: Level) {
        self.lock().lines.insert(line, MockLine::new(level));
    }

    /// Drive a line to `level`, firing matching handlers if the level changed.
    ///
    /// # Errors
    /// Returns `LineUnavailable` for an unknown line.
    pub fn set_level(&self, line: LineId, level: Level, timestamp: Timestamp) -> Result<()> {
        let handlers = {
            let mut state = self.lock();
            let entry = state.line_mut(line)?;
            if entry.level == level {
                return Ok(());
            }
            entry.level = level;
            matching_handlers(entry, level)
        };
        fire(&handlers, EdgeEvent { line, level, timestamp });
        Ok(())
    }

    /// Deliver an edge interrupt reporting `level` whether or not the line
    /// actually changed.
    ///
    /// # Errors
    /// Returns `LineUnavailable` for an unknown line.
    pub fn inject_edge(&self, line: LineId, level: Level, timestamp: Timestamp) -> Result<()> {
        let handlers = {
            let mut state = self.lock();
            let entry = state.line_mut(line)?;
            entry.level = level;
            matching_handlers(entry, level)
        };
        fire(&handlers, EdgeEvent { line, level, timestamp });
        Ok(())
    }

    /// Make every subsequent `claim` of `line` fail.
    pub fn fail_claim_on(&self, line: LineId) {
        self.lock().fail_claim.insert(line);
    }

    /// Make every subsequent interrupt registration on `line` fail.
    pub fn fail_interrupt_on(&self, line: LineId) {
        self.lock().fail_interrupt.insert(line);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.fail_claim.clear();
        state.fail_interrupt.clear();
    }

    /// Make `set_debounce` report `Unsupported`.
    pub fn set_debounce_unsupported(&self, unsupported: bool) {
        self.lock().debounce_unsupported = unsupported;
    }

    /// Number of handlers registered on `line`.
    pub fn interrupt_count(&self, line: LineId) -> usize {
        self.lock().lines.get(&line).map_or(0, |l| l.handlers.len())
    }

    /// Hardware debounce last configured on `line`.
    pub fn debounce_of(&self, line: LineId) -> Option<u64> {
        self.lock().lines.get(&line).and_then(|l| l.debounce_us)
    }

    /// Direction of a claimed line.
    pub fn direction_of(&self, line: LineId) -> Option<LineDirection> {
        self.lock().lines.get(&line).and_then(|l| l.direction)
    }
}

fn matching_handlers(line: &MockLine, level: Level) -> Vec<EdgeHandler> {
    line.handlers
        .iter()
        .filter(|r| r.trigger.matches(level))
        .map(|r| Arc::clone(&r.handler))
        .collect()
}

fn fire(handlers: &[EdgeHandler], event: EdgeEvent) {
    for handler in handlers {
        handler(event);
    }
}

impl fmt::Debug for MockGpio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        let mut lines: Vec<_> = state.lines.keys().copied().collect();
        lines.sort();
        f.debug_struct("MockGpio").field("lines", &lines).finish()
    }
}

impl GpioController for MockGpio {
    fn owner(&self, line: LineId) -> Option<OwnerToken> {
        self.lock().lines.get(&line).and_then(|l| l.owner)
    }

    fn claim(&self, line: LineId, owner: OwnerToken, direction: LineDirection) -> Result<()> {
        let mut state = self.lock();
        if state.fail_claim.contains(&line) {
            return Err(HardwareError::line_unavailable(line, "request refused"));
        }
        let entry = state.line_mut(line)?;
        match entry.owner {
            Some(current) if current != owner => Err(HardwareError::line_busy(line, current)),
            _ => {
                entry.owner = Some(owner);
                entry.direction = Some(direction);
                Ok(())
            }
        }
    }

    fn release(&self, line: LineId, owner: OwnerToken) {
        if let Some(entry) = self.lock().lines.get_mut(&line)
            && entry.owner == Some(owner)
        {
            entry.owner = None;
            entry.direction = None;
        }
    }

    fn set_debounce(&self, line: LineId, micros: u64) -> Result<()> {
        let mut state = self.lock();
        if state.debounce_unsupported {
            return Err(HardwareError::unsupported("set_debounce"));
        }
        state.line_mut(line)?.debounce_us = Some(micros);
        Ok(())
    }

    fn read_level(&self, line: LineId) -> Result<Level> {
        Ok(self.lock().line(line)?.level)
    }

    fn register_edge_interrupt(
        &self,
        line: LineId,
        trigger: EdgeTrigger,
        handler: EdgeHandler,
    ) -> Result<InterruptHandle> {
        let mut state = self.lock();
        if state.fail_interrupt.contains(&line) {
            return Err(HardwareError::interrupt(line, "no interrupt available"));
        }
        state.next_handler_id += 1;
        let id = state.next_handler_id;
        let entry = state
            .lines
            .get_mut(&line)
            .ok_or_else(|| HardwareError::interrupt(line, "no such line"))?;
        entry.handlers.push(Registration {
            id,
            trigger,
            handler,
        });
        Ok(InterruptHandle::new(line, id))
    }

    fn unregister_edge_interrupt(&self, handle: InterruptHandle) {
        if let Some(entry) = self.lock().lines.get_mut(&handle.line()) {
            entry.handlers.retain(|r| r.id != handle.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LINE: LineId = LineId::new(4);

    fn counting_handler(count: &Arc<AtomicUsize>) -> EdgeHandler {
        let count = Arc::clone(count);
        Arc::new(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_claim_and_release() {
        let gpio = MockGpio::with_lines([LINE]);
        let a = OwnerToken::next();
        let b = OwnerToken::next();

        gpio.claim(LINE, a, LineDirection::Input).unwrap();
        assert_eq!(gpio.owner(LINE), Some(a));
        assert_eq!(gpio.direction_of(LINE), Some(LineDirection::Input));

        let err = gpio.claim(LINE, b, LineDirection::Output).unwrap_err();
        assert!(matches!(err, HardwareError::LineBusy { owner, .. } if owner == a));

        // Releasing with the wrong token does nothing.
        gpio.release(LINE, b);
        assert_eq!(gpio.owner(LINE), Some(a));

        gpio.release(LINE, a);
        assert_eq!(gpio.owner(LINE), None);
        gpio.claim(LINE, b, LineDirection::Output).unwrap();
    }

    #[test]
    fn test_unknown_line() {
        let gpio = MockGpio::new();
        assert!(matches!(
            gpio.read_level(LINE),
            Err(HardwareError::LineUnavailable { .. })
        ));
        assert!(gpio.set_level(LINE, Level::Low, Timestamp::ZERO).is_err());
    }

    #[test]
    fn test_set_level_fires_only_on_change() {
        let gpio = MockGpio::with_lines([LINE]);
        let count = Arc::new(AtomicUsize::new(0));
        gpio.register_edge_interrupt(LINE, EdgeTrigger::Both, counting_handler(&count))
            .unwrap();

        gpio.set_level(LINE, Level::High, Timestamp::ZERO).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        gpio.set_level(LINE, Level::Low, Timestamp::from_micros(1)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(gpio.read_level(LINE).unwrap(), Level::Low);

        gpio.inject_edge(LINE, Level::Low, Timestamp::from_micros(2)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_trigger_filtering_and_unregister() {
        let gpio = MockGpio::with_lines([LINE]);
        let count = Arc::new(AtomicUsize::new(0));
        let handle = gpio
            .register_edge_interrupt(LINE, EdgeTrigger::Falling, counting_handler(&count))
            .unwrap();
        assert_eq!(gpio.interrupt_count(LINE), 1);

        gpio.set_level(LINE, Level::Low, Timestamp::ZERO).unwrap();
        gpio.set_level(LINE, Level::High, Timestamp::from_micros(5)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        gpio.unregister_edge_interrupt(handle);
        assert_eq!(gpio.interrupt_count(LINE), 0);
        gpio.set_level(LINE, Level::Low, Timestamp::from_micros(10)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_injected_failures() {
        let gpio = MockGpio::with_lines([LINE]);
        gpio.fail_claim_on(LINE);
        gpio.fail_interrupt_on(LINE);

        assert!(matches!(
            gpio.claim(LINE, OwnerToken::next(), LineDirection::Input),
            Err(HardwareError::LineUnavailable { .. })
        ));
        let count = Arc::new(AtomicUsize::new(0));
        assert!(matches!(
            gpio.register_edge_interrupt(LINE, EdgeTrigger::Both, counting_handler(&count)),
            Err(HardwareError::InterruptRegistration { .. })
        ));

        gpio.clear_failures();
        assert!(gpio.claim(LINE, OwnerToken::next(), LineDirection::Input).is_ok());
    }

    #[test]
    fn test_debounce_configuration() {
        let gpio = MockGpio::with_lines([LINE]);
        gpio.set_debounce(LINE, 0).unwrap();
        assert_eq!(gpio.debounce_of(LINE), Some(0));

        gpio.set_debounce_unsupported(true);
        assert!(matches!(
            gpio.set_debounce(LINE, 0),
            Err(HardwareError::Unsupported { .. })
        ));
    }
}
