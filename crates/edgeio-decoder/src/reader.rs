//! Wiegand reader driver.
//!
//! Binds a [`WiegandDecoder`] to its two GPIO lines, rearms the completion
//! timer after every accepted bit and publishes a data-ready notification
//! when the timer expires.
//!
//! # Locking
//!
//! Edge handlers, the completion timer and every query take the same state
//! mutex for their whole read-modify-write. Enable and disable are further
//! serialized by a lifecycle mutex that also guards the interrupt
//! registrations; it is always taken before the state mutex.

use crate::wiegand::{EdgeOutcome, WiegandDecoder};
use edgeio_core::{
    Error, LineId, NoiseCode, Result, Timestamp, WiegandFrame, WiegandLine, WiegandReaderConfig,
    WiegandTiming,
};
use edgeio_hardware::{
    Clock, EdgeEvent, EdgeHandler, EdgeTrigger, GpioController, InterruptHandle, LineDirection,
    OneShotScheduler, OwnerToken, TimerHandle,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

struct ReaderState {
    decoder: WiegandDecoder,
    timer: Option<TimerHandle>,
}

/// State shared with edge handlers and timer tasks.
struct Shared {
    name: String,
    state: Mutex<ReaderState>,
    ready: watch::Sender<u64>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_edge(
        self: &Arc<Self>,
        role: WiegandLine,
        event: EdgeEvent,
        scheduler: &dyn OneShotScheduler,
    ) {
        let mut state = self.lock();
        let outcome = state
            .decoder
            .on_edge(role, event.level.is_low(), event.timestamp);

        match outcome {
            EdgeOutcome::BitAccepted { rearm_after_us, .. } => {
                if let Some(previous) = state.timer.take() {
                    scheduler.cancel(previous);
                }
                // read_frame reports Busy until the window has strictly elapsed.
                let after = Duration::from_micros(rearm_after_us.saturating_add(1));
                let shared = Arc::clone(self);
                let handle = scheduler.schedule(after, Box::new(move || shared.frame_ready()));
                state.timer = Some(handle);
            }
            EdgeOutcome::Noise(code) => {
                debug!(reader = %self.name, line = %role, noise = %code, "Wiegand edge rejected");
            }
            EdgeOutcome::FrameFull => {
                trace!(reader = %self.name, "Wiegand frame full, bit dropped");
            }
            EdgeOutcome::Ignored | EdgeOutcome::Duplicate | EdgeOutcome::PulseStarted => {}
        }
    }

    fn frame_ready(&self) {
        self.ready.send_modify(|generation| *generation = generation.wrapping_add(1));
        debug!(reader = %self.name, "Wiegand frame ready");
    }
}

/// A Wiegand reader on a pair of GPIO lines.
///
/// A new reader is disabled and owns nothing. [`enable`](Self::enable)
/// claims both lines and registers their interrupts;
/// [`disable`](Self::disable) (also run on drop) gives everything back.
///
/// # Examples
///
/// ```
/// use edgeio_core::{Level, LineId, Timestamp, WiegandReaderConfig, WiegandTiming};
/// use edgeio_decoder::WiegandReader;
/// use edgeio_hardware::mock::{MockClock, MockGpio, MockScheduler};
/// use std::sync::Arc;
///
/// let (d0, d1) = (LineId::new(4), LineId::new(5));
/// let gpio = MockGpio::with_lines([d0, d1]);
/// let clock = MockClock::new();
/// let scheduler = MockScheduler::new(clock.clone());
///
/// let config = WiegandReaderConfig {
///     name: "wiegand".to_string(),
///     d0,
///     d1,
///     timing: WiegandTiming::default(),
/// };
/// let reader = WiegandReader::new(
///     &config,
///     Arc::new(gpio.clone()),
///     Arc::new(scheduler.clone()),
///     Arc::new(clock.clone()),
/// );
/// reader.enable().unwrap();
///
/// gpio.set_level(d1, Level::Low, Timestamp::from_micros(0)).unwrap();
/// gpio.set_level(d1, Level::High, Timestamp::from_micros(50)).unwrap();
///
/// scheduler.run_until(Timestamp::from_micros(5_000));
/// assert_eq!(reader.read_frame().unwrap().to_string(), "0 1 1");
/// ```
pub struct WiegandReader {
    d0: LineId,
    d1: LineId,
    owner: OwnerToken,
    gpio: Arc<dyn GpioController>,
    scheduler: Arc<dyn OneShotScheduler>,
    clock: Arc<dyn Clock>,
    shared: Arc<Shared>,
    interrupts: Mutex<Vec<InterruptHandle>>,
}

impl WiegandReader {
    /// Create a disabled reader.
    pub fn new(
        config: &WiegandReaderConfig,
        gpio: Arc<dyn GpioController>,
        scheduler: Arc<dyn OneShotScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (ready, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            name: config.name.clone(),
            state: Mutex::new(ReaderState {
                decoder: WiegandDecoder::new(config.timing),
                timer: None,
            }),
            ready,
        });

        Self {
            d0: config.d0,
            d1: config.d1,
            owner: OwnerToken::next(),
            gpio,
            scheduler,
            clock,
            shared,
            interrupts: Mutex::new(Vec::new()),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Vec<InterruptHandle>> {
        self.interrupts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Data lines as `(d0, d1)`.
    pub fn lines(&self) -> (LineId, LineId) {
        (self.d0, self.d1)
    }

    /// Token this reader claims its lines with.
    pub fn owner(&self) -> OwnerToken {
        self.owner
    }

    fn line_of(&self, role: WiegandLine) -> LineId {
        match role {
            WiegandLine::D0 => self.d0,
            WiegandLine::D1 => self.d1,
        }
    }

    /// Acquire both lines and start decoding.
    ///
    /// Enabling an enabled reader only resets its frame and noise state.
    ///
    /// # Errors
    /// - `Busy` if either line is owned by another consumer
    /// - `ResourceUnavailable` if a line cannot be claimed or its interrupt
    ///   cannot be registered
    ///
    /// On error nothing acquired by this call remains claimed or registered.
    pub fn enable(&self) -> Result<()> {
        let mut interrupts = self.lifecycle();

        if interrupts.is_empty() {
            for role in WiegandLine::ALL {
                let line = self.line_of(role);
                if let Some(owner) = self.gpio.owner(line)
                    && owner != self.owner
                {
                    return Err(Error::busy(format!("Line {line} is owned by {owner}")));
                }
            }

            if let Err(e) = self.acquire(&mut interrupts) {
                warn!(reader = %self.name(), error = %e, "Wiegand enable failed, rolling back");
                self.release(&mut interrupts);
                return Err(e);
            }
        }

        self.shared.lock().decoder.enable();
        info!(reader = %self.name(), d0 = %self.d0, d1 = %self.d1, "Wiegand reader enabled");
        Ok(())
    }

    fn acquire(&self, interrupts: &mut Vec<InterruptHandle>) -> Result<()> {
        for role in WiegandLine::ALL {
            let line = self.line_of(role);
            self.gpio.claim(line, self.owner, LineDirection::Input)?;
            if let Err(e) = self.gpio.set_debounce(line, 0) {
                debug!(reader = %self.name(), line = %line, error = %e, "Hardware debounce not disabled");
            }
        }

        for role in WiegandLine::ALL {
            let line = self.line_of(role);
            let handle =
                self.gpio
                    .register_edge_interrupt(line, EdgeTrigger::Both, self.edge_handler(role))?;
            interrupts.push(handle);
        }
        Ok(())
    }

    fn release(&self, interrupts: &mut Vec<InterruptHandle>) {
        for handle in interrupts.drain(..) {
            self.gpio.unregister_edge_interrupt(handle);
        }
        // Only lines held with our own token are released.
        self.gpio.release(self.d0, self.owner);
        self.gpio.release(self.d1, self.owner);
    }

    fn edge_handler(&self, role: WiegandLine) -> EdgeHandler {
        let shared = Arc::clone(&self.shared);
        let scheduler = Arc::clone(&self.scheduler);
        Arc::new(move |event: EdgeEvent| shared.on_edge(role, event, scheduler.as_ref()))
    }

    /// Stop decoding, cancel the completion timer and give back both lines.
    /// Idempotent.
    pub fn disable(&self) {
        let mut interrupts = self.lifecycle();

        let was_enabled = {
            let mut state = self.shared.lock();
            let was_enabled = state.decoder.is_enabled();
            state.decoder.disable();
            if let Some(timer) = state.timer.take() {
                self.scheduler.cancel(timer);
            }
            was_enabled
        };

        self.release(&mut interrupts);
        if was_enabled {
            info!(reader = %self.name(), "Wiegand reader disabled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.lock().decoder.is_enabled()
    }

    /// Last complete frame.
    ///
    /// # Errors
    /// `NotEnabled` when disabled, `Busy` while a frame may still be
    /// accumulating.
    pub fn read_frame(&self) -> Result<WiegandFrame> {
        self.read_frame_at(self.clock.now())
    }

    /// Last complete frame as seen at `now`.
    ///
    /// # Errors
    /// As [`read_frame`](Self::read_frame).
    pub fn read_frame_at(&self, now: Timestamp) -> Result<WiegandFrame> {
        self.shared.lock().decoder.read_frame(now)
    }

    /// Pending noise code, cleared by the read.
    pub fn take_noise(&self) -> NoiseCode {
        self.shared.lock().decoder.take_noise()
    }

    /// Receiver of the frame-ready generation counter.
    ///
    /// The value increases every time the completion timer expires.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.ready.subscribe()
    }

    pub fn timing(&self) -> WiegandTiming {
        self.shared.lock().decoder.timing()
    }

    pub fn set_pulse_width_min_us(&self, micros: u64) {
        self.shared.lock().decoder.set_pulse_width_min_us(micros);
    }

    pub fn set_pulse_width_max_us(&self, micros: u64) {
        self.shared.lock().decoder.set_pulse_width_max_us(micros);
    }

    pub fn set_pulse_interval_min_us(&self, micros: u64) {
        self.shared.lock().decoder.set_pulse_interval_min_us(micros);
    }

    pub fn set_pulse_interval_max_us(&self, micros: u64) {
        self.shared.lock().decoder.set_pulse_interval_max_us(micros);
    }
}

impl fmt::Debug for WiegandReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiegandReader")
            .field("name", &self.shared.name)
            .field("d0", &self.d0)
            .field("d1", &self.d1)
            .field("decoder", &self.shared.lock().decoder)
            .finish()
    }
}

impl Drop for WiegandReader {
    fn drop(&mut self) {
        self.disable();
    }
}
