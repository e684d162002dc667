//! `IngressPump` — the recv-fw write-callback.
//!
//! Runs in the BLE stack's task context, so it must never block. Lazily
//! spawns the flash-writer task on the first payload (adapted from the
//! firmware crate's `feed_ble_bytes` cross-thread channel-feed, generalized
//! from a fixed always-running I/O thread to a task spawned on demand).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;

use crate::config::OtaConfig;

use super::ring::ByteRing;
use super::task_pin;

pub struct IngressPump {
    ring: Arc<ByteRing>,
    spawned: AtomicBool,
    flash_task_priority: u8,
    flash_task_stack_bytes: usize,
}

impl IngressPump {
    pub fn new(ring: Arc<ByteRing>, config: &OtaConfig) -> Self {
        Self {
            ring,
            spawned: AtomicBool::new(false),
            flash_task_priority: config.flash_task_priority,
            flash_task_stack_bytes: config.flash_task_stack_bytes,
        }
    }

    pub fn ota_started(&self) -> bool {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Handle one recv-fw write payload. `spawn_writer` builds and runs the
    /// flash-writer task; it is invoked at most once, on the first call.
    pub fn on_write(&self, payload: &[u8], spawn_writer: impl FnOnce() + Send + 'static) {
        if self.spawned.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
            task_pin::spawn_with_priority(
                self.flash_task_priority,
                self.flash_task_stack_bytes,
                "flash-writer\0",
                spawn_writer,
            );
        }

        if !self.ring.push(payload.to_vec()) {
            warn!("ingress: ring buffer full, dropping {} byte payload", payload.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn spawns_writer_exactly_once() {
        let ring = Arc::new(ByteRing::new(8192));
        let pump = IngressPump::new(ring, &crate::config::OtaConfig::default());
        let (tx, rx) = mpsc::channel();

        assert!(!pump.ota_started());
        let tx1 = tx.clone();
        pump.on_write(b"abc", move || tx1.send(()).unwrap());
        let tx2 = tx.clone();
        pump.on_write(b"def", move || tx2.send(()).unwrap());

        assert!(pump.ota_started());
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok(()));
        assert_eq!(rx.recv_timeout(Duration::from_millis(50)), Err(mpsc::RecvTimeoutError::Timeout));
    }

    #[test]
    fn full_ring_drops_silently() {
        let ring = Arc::new(ByteRing::new(4));
        let pump = IngressPump::new(ring.clone(), &crate::config::OtaConfig::default());
        pump.on_write(&[0u8; 4], || {});
        pump.on_write(&[0u8; 1], || {});
        assert_eq!(ring.bytes_queued(), 4);
    }
}
