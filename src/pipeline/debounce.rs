//! Trailing-edge debounce for rapidly changing filter edits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Quiet period between the last filter edit and the query it triggers.
pub const FILTER_QUIET_PERIOD: Duration = Duration::from_millis(150);

/// Holds at most one pending emission; scheduling again before the quiet
/// period elapses replaces it (last edit wins). The very first schedule
/// fires immediately so the initial query never waits out the timer.
pub struct DebounceGate {
    quiet_period: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    first: AtomicBool,
}

impl DebounceGate {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: Mutex::new(None),
            first: AtomicBool::new(true),
        }
    }

    /// Schedule `emit` after the quiet period, cancelling any previously
    /// scheduled, not-yet-fired emission. Must be called from within a
    /// tokio runtime.
    pub fn schedule<F>(&self, emit: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        // The one-shot first-evaluation flag: consumed exactly once.
        if self.first.swap(false, Ordering::SeqCst) {
            emit();
            return;
        }

        let quiet_period = self.quiet_period;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            emit();
        }));
    }

    /// Cancel a pending emission, if any. Called on teardown so nothing
    /// fires after the owning pipeline is gone.
    pub fn cancel_pending(&self) {
        if let Some(handle) = self.pending.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Consume the first-evaluation flag without emitting, so a later
    /// schedule debounces normally.
    pub fn mark_started(&self) {
        self.first.store(false, Ordering::SeqCst);
    }
}

impl Drop for DebounceGate {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
