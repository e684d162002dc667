//! Device-side ingress ring buffer.
//!
//! A byte-capacity-bounded queue of variable-length items, one item per GATT
//! write payload, delivered to the consumer in submission order. The real
//! hardware discipline is single-producer (the BLE write callback) /
//! single-consumer (the flash writer task); this type enforces that
//! discipline through its API (`push` never blocks, `recv` blocks the calling
//! thread with a timeout) rather than through a lock-free layout, since the
//! engine has exactly one producer and one consumer by construction.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

struct State {
    items: VecDeque<Vec<u8>>,
    bytes_queued: usize,
}

/// Bounded byte-capacity queue of write payloads.
pub struct ByteRing {
    capacity: usize,
    state: Mutex<State>,
    not_empty: Condvar,
}

impl ByteRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State { items: VecDeque::new(), bytes_queued: 0 }),
            not_empty: Condvar::new(),
        }
    }

    /// Push one item with a zero timeout: if it would overflow `capacity`,
    /// the item is dropped and `false` is returned. The caller (`IngressPump`)
    /// logs the drop; the ring itself never blocks the producer.
    pub fn push(&self, item: Vec<u8>) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.bytes_queued + item.len() > self.capacity {
            return false;
        }
        state.bytes_queued += item.len();
        state.items.push_back(item);
        self.not_empty.notify_one();
        true
    }

    /// Block the calling thread for up to `timeout` waiting for the next
    /// item. Returns `None` on timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(item) = state.items.pop_front() {
                state.bytes_queued -= item.len();
                return Some(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, result) = self.not_empty.wait_timeout(state, deadline - now).unwrap();
            state = guard;
            if result.timed_out() && state.items.is_empty() {
                return None;
            }
        }
    }

    pub fn bytes_queued(&self) -> usize {
        self.state.lock().unwrap().bytes_queued
    }
}
