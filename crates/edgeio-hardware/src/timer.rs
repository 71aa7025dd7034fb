//! One-shot timers on the tokio runtime.
//!
//! Every scheduled timer is a spawned task that sleeps and then runs its
//! callback. Cancellation removes the timer from the pending table before
//! aborting the task, so once [`cancel`](OneShotScheduler::cancel) returns
//! the callback either already started or never will.

use crate::error::{HardwareError, Result};
use crate::traits::{OneShotScheduler, TimerHandle, TimerTask};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

type PendingTimers = Arc<Mutex<HashMap<u64, AbortHandle>>>;

/// Whole microseconds in `after`, saturating at `u64::MAX`.
fn saturating_micros(after: Duration) -> u64 {
    u64::try_from(after.as_micros()).unwrap_or(u64::MAX)
}

fn lock(pending: &PendingTimers) -> MutexGuard<'_, HashMap<u64, AbortHandle>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`OneShotScheduler`] backed by tokio tasks.
///
/// # Examples
///
/// ```
/// use edgeio_hardware::timer::TokioScheduler;
/// use edgeio_hardware::traits::OneShotScheduler;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> edgeio_hardware::Result<()> {
///     let scheduler = TokioScheduler::current()?;
///     let (tx, rx) = tokio::sync::oneshot::channel();
///
///     scheduler.schedule(Duration::from_micros(500), Box::new(move || {
///         let _ = tx.send(());
///     }));
///
///     rx.await.unwrap();
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct TokioScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    pending: PendingTimers,
}

impl TokioScheduler {
    /// Create a scheduler spawning onto `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a scheduler on the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` when called outside a tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| HardwareError::unsupported(format!("tokio runtime required: {e}")))
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl OneShotScheduler for TokioScheduler {
    fn schedule(&self, after: Duration, task: TimerTask) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);

        // Hold the table while spawning so the task cannot observe itself missing.
        let mut table = lock(&self.pending);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            let still_pending = lock(&pending).remove(&id).is_some();
            if still_pending {
                task();
            }
        });
        table.insert(id, join.abort_handle());
        trace!(timer = id, after_us = saturating_micros(after), "Timer scheduled");

        TimerHandle::new(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(abort) = lock(&self.pending).remove(&handle.id()) {
            abort.abort();
            trace!(timer = handle.id(), "Timer cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, abort) in lock(&self.pending).drain() {
            abort.abort();
        }
    }
}
