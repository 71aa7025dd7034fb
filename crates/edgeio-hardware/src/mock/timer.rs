//! One-shot timers that fire only when a test runs them.

use super::clock::MockClock;
use crate::traits::{Clock, OneShotScheduler, TimerHandle, TimerTask};
use edgeio_core::Timestamp;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct PendingTimer {
    id: u64,
    deadline: Timestamp,
    task: TimerTask,
}

#[derive(Default)]
struct SchedulerState {
    next_id: u64,
    pending: Vec<PendingTimer>,
}

/// [`OneShotScheduler`] driven by a [`MockClock`].
///
/// Deadlines are computed from the clock at scheduling time. Expired timers
/// run from [`run_due`](Self::run_due) or [`run_until`](Self::run_until), in
/// deadline order.
///
/// # Examples
///
/// ```
/// use edgeio_hardware::mock::{MockClock, MockScheduler};
/// use edgeio_hardware::traits::OneShotScheduler;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::time::Duration;
///
/// let clock = MockClock::new();
/// let scheduler = MockScheduler::new(clock.clone());
/// let fired = Arc::new(AtomicBool::new(false));
///
/// let flag = Arc::clone(&fired);
/// scheduler.schedule(Duration::from_micros(2_700), Box::new(move || {
///     flag.store(true, Ordering::SeqCst);
/// }));
///
/// clock.advance(2_699);
/// assert_eq!(scheduler.run_due(), 0);
///
/// clock.advance(1);
/// assert_eq!(scheduler.run_due(), 1);
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Clone)]
pub struct MockScheduler {
    clock: MockClock,
    state: Arc<Mutex<SchedulerState>>,
}

impl MockScheduler {
    pub fn new(clock: MockClock) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clock deadlines are measured against.
    pub fn clock(&self) -> &MockClock {
        &self.clock
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.lock().pending.iter().map(|t| t.deadline).min()
    }

    fn take_due(&self, now: Timestamp) -> Option<TimerTask> {
        let mut state = self.lock();
        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, _)| i)?;
        Some(state.pending.remove(index).task)
    }

    /// Run every timer whose deadline has passed. Returns how many ran.
    ///
    /// Tasks run outside the scheduler lock and may schedule new timers.
    pub fn run_due(&self) -> usize {
        let now = self.clock.now();
        let mut ran = 0;
        while let Some(task) = self.take_due(now) {
            task();
            ran += 1;
        }
        ran
    }

    /// Advance the clock to `until`, stopping at each deadline on the way so
    /// tasks observe the time they were due. Returns how many timers ran.
    pub fn run_until(&self, until: Timestamp) -> usize {
        let mut ran = 0;
        while let Some(deadline) = self.next_deadline()
            && deadline <= until
        {
            if deadline > self.clock.now() {
                self.clock.set(deadline.as_micros());
            }
            ran += self.run_due();
        }
        if until > self.clock.now() {
            self.clock.set(until.as_micros());
        }
        ran
    }
}

impl fmt::Debug for MockScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockScheduler")
            .field("now", &self.clock.now())
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl OneShotScheduler for MockScheduler {
    fn schedule(&self, after: Duration, task: TimerTask) -> TimerHandle {
        let after_us = u64::try_from(after.as_micros()).unwrap_or(u64::MAX);
        let deadline = self.clock.now().saturating_add_micros(after_us);

        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.pending.push(PendingTimer { id, deadline, task });
        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.lock().pending.retain(|t| t.id != handle.id());
    }
}
