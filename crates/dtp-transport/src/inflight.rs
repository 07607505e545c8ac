use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Count of accepted requests that were queued but not yet answered.
///
/// ## Protocol
/// The dispatcher increments strictly after a successful enqueue; the worker
/// decrements strictly after the response was written and the connection closed.
/// Reads and updates are lock-free; the mutex only backs the wake-up on reaching zero.
#[derive(Debug, Default)]
pub struct InFlightCounter {
    count: AtomicUsize,
    drained_lock: Mutex<()>,
    drained: Condvar,
}

impl InFlightCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// # Panics
    /// On a decrement at zero: a request was answered twice.
    pub fn decrement(&self) {
        let prev = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or_else(|_| panic!("InFlightCounter: decrement called at 0"));

        if prev == 1 {
            let _guard = self.drained_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.drained.notify_all();
        }
    }

    pub fn current(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Blocks until the count reaches zero.
    pub fn wait_for_zero(&self) {
        let mut guard = self.drained_lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.current() != 0 {
            guard = self.drained.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until the count reaches zero or `timeout` elapses. Returns whether it drained.
    pub fn wait_for_zero_timeout(&self, timeout: Duration) -> bool {
        let guard = self.drained_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (_guard, _) = self
            .drained
            .wait_timeout_while(guard, timeout, |_| self.current() != 0)
            .unwrap_or_else(PoisonError::into_inner);
        self.current() == 0
    }
}
