//! Counting semaphore bounding concurrent flash operations to one.
//!
//! Mirrors FreeRTOS's `xSemaphoreCreateCounting(max, initial)` / `Take` /
//! `Give` pair over a `Mutex` + `Condvar`, since `std` has no native counting
//! semaphore. Per spec, this engine always constructs one with `max = 100`,
//! `initial = 1` — the headroom above 1 is never exercised.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

pub struct CountingSemaphore {
    max: usize,
    count: Mutex<usize>,
    available: Condvar,
}

impl CountingSemaphore {
    pub fn new(max: usize, initial: usize) -> Self {
        Self { max, count: Mutex::new(initial.min(max)), available: Condvar::new() }
    }

    /// Block up to `timeout` for a permit. Returns `false` on timeout.
    pub fn take(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock().unwrap();
        loop {
            if *count > 0 {
                *count -= 1;
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, result) = self.available.wait_timeout(count, deadline - now).unwrap();
            count = guard;
            if result.timed_out() && *count == 0 {
                return false;
            }
        }
    }

    /// Return a permit. No-op past `max` (mirrors FreeRTOS's saturating give).
    pub fn give(&self) {
        let mut count = self.count.lock().unwrap();
        if *count < self.max {
            *count += 1;
        }
        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_permit_excludes_second_taker() {
        let sem = CountingSemaphore::new(100, 1);
        assert!(sem.take(Duration::from_millis(10)));
        assert!(!sem.take(Duration::from_millis(10)));
    }

    #[test]
    fn give_restores_a_permit() {
        let sem = CountingSemaphore::new(100, 1);
        assert!(sem.take(Duration::from_millis(10)));
        sem.give();
        assert!(sem.take(Duration::from_millis(10)));
    }

    #[test]
    fn give_saturates_at_max() {
        let sem = CountingSemaphore::new(1, 1);
        sem.give();
        sem.give();
        assert!(sem.take(Duration::from_millis(10)));
        assert!(!sem.take(Duration::from_millis(10)));
    }
}
