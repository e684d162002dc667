//! Monotonic progress counter with a wait-for-threshold primitive.
//!
//! This is the client's sole flow-control signal: `SessionController` gates
//! sending sector `s+1` on a `wait_for(expected_pct)` future resolving.
//! Re-architected from the original's closure-captured waiter array (per the
//! design notes) into a small shared state object plus waiter futures that
//! register a [`Waker`] the ordinary way.

use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::error::OtaError;

struct WaiterSlot {
    threshold: u8,
    result: Option<Result<(), OtaError>>,
    waker: Option<Waker>,
}

struct Inner {
    progress: u8,
    waiters: Vec<Arc<Mutex<WaiterSlot>>>,
    terminal_error: Option<OtaError>,
}

/// Shared, cloneable handle to one session's progress state.
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Mutex<Inner>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                progress: 0,
                waiters: Vec::new(),
                terminal_error: None,
            })),
        }
    }

    /// Current progress percentage, `0..=100`.
    pub fn current(&self) -> u8 {
        self.inner.lock().unwrap().progress
    }

    /// Report a new progress value. Ignored unless strictly greater than the
    /// current value (monotonic). Wakes and removes every waiter whose
    /// threshold is now satisfied.
    pub fn update(&self, reported: u8) {
        let mut inner = self.inner.lock().unwrap();
        if reported <= inner.progress {
            return;
        }
        inner.progress = reported;
        let progress = inner.progress;
        inner.waiters.retain(|slot| {
            let mut slot = slot.lock().unwrap();
            if slot.threshold > progress {
                return true;
            }
            slot.result = Some(Ok(()));
            if let Some(waker) = slot.waker.take() {
                waker.wake();
            }
            false
        });
    }

    /// Future that resolves once `current() >= threshold`, immediately if
    /// already satisfied.
    pub fn wait_for(&self, threshold: u8) -> WaitFor {
        WaitFor {
            inner: self.inner.clone(),
            threshold,
            slot: None,
        }
    }

    /// Fail every outstanding waiter with `err` and make the tracker refuse
    /// all future waits with the same error. Idempotent: calling this twice
    /// has the same observable effect as calling it once (the second call
    /// finds no waiters left to reject and the terminal error already set).
    pub fn reject_all(&self, err: OtaError) {
        let mut inner = self.inner.lock().unwrap();
        inner.terminal_error.get_or_insert_with(|| err.clone());
        for slot in inner.waiters.drain(..) {
            let mut slot = slot.lock().unwrap();
            slot.result = Some(Err(err.clone()));
            if let Some(waker) = slot.waker.take() {
                waker.wake();
            }
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`ProgressTracker::wait_for`].
pub struct WaitFor {
    inner: Arc<Mutex<Inner>>,
    threshold: u8,
    slot: Option<Arc<Mutex<WaiterSlot>>>,
}

impl core::future::Future for WaitFor {
    type Output = Result<(), OtaError>;

    fn poll(self: core::pin::Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut inner = this.inner.lock().unwrap();

        if let Some(err) = &inner.terminal_error {
            return Poll::Ready(Err(err.clone()));
        }
        if inner.progress >= this.threshold {
            return Poll::Ready(Ok(()));
        }

        match &this.slot {
            Some(slot) => {
                let mut slot = slot.lock().unwrap();
                if let Some(result) = slot.result.take() {
                    return Poll::Ready(result);
                }
                slot.waker = Some(cx.waker().clone());
            }
            None => {
                let slot = Arc::new(Mutex::new(WaiterSlot {
                    threshold: this.threshold,
                    result: None,
                    waker: Some(cx.waker().clone()),
                }));
                inner.waiters.push(slot.clone());
                this.slot = Some(slot);
            }
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::block_on;

    #[test]
    fn monotonic_progress_ignores_decreases() {
        let tracker = ProgressTracker::new();
        tracker.update(10);
        tracker.update(5);
        assert_eq!(tracker.current(), 10);
        tracker.update(10);
        assert_eq!(tracker.current(), 10);
        tracker.update(55);
        assert_eq!(tracker.current(), 55);
    }

    #[test]
    fn wait_for_resolves_immediately_if_already_met() {
        let tracker = ProgressTracker::new();
        tracker.update(80);
        block_on(tracker.wait_for(50)).unwrap();
    }

    #[test]
    fn wait_for_resolves_when_threshold_crossed() {
        let tracker = ProgressTracker::new();
        let waiter = tracker.clone();
        let handle = std::thread::spawn(move || block_on(waiter.wait_for(50)));
        std::thread::sleep(std::time::Duration::from_millis(20));
        tracker.update(60);
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn identical_threshold_waiters_resolve_together() {
        let tracker = ProgressTracker::new();
        let a = tracker.clone();
        let b = tracker.clone();
        let ha = std::thread::spawn(move || block_on(a.wait_for(50)));
        let hb = std::thread::spawn(move || block_on(b.wait_for(50)));
        std::thread::sleep(std::time::Duration::from_millis(20));
        tracker.update(50);
        ha.join().unwrap().unwrap();
        hb.join().unwrap().unwrap();
    }

    #[test]
    fn reject_all_fails_pending_waiters() {
        let tracker = ProgressTracker::new();
        let waiter = tracker.clone();
        let handle = std::thread::spawn(move || block_on(waiter.wait_for(50)));
        std::thread::sleep(std::time::Duration::from_millis(20));
        tracker.reject_all(OtaError::ProgressStall);
        assert_eq!(handle.join().unwrap(), Err(OtaError::ProgressStall));
    }

    #[test]
    fn reject_all_is_idempotent() {
        let tracker = ProgressTracker::new();
        tracker.reject_all(OtaError::Disconnected);
        tracker.reject_all(OtaError::ProgressStall);
        // the second call must not overwrite the terminal error seen by new waiters
        let result = block_on(tracker.wait_for(10));
        assert_eq!(result, Err(OtaError::Disconnected));
    }

    #[test]
    fn wait_for_after_reject_fails_immediately() {
        let tracker = ProgressTracker::new();
        tracker.reject_all(OtaError::Busy);
        let result = block_on(tracker.wait_for(1));
        assert_eq!(result, Err(OtaError::Busy));
    }
}
