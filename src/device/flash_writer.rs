//! `FlashWriter` — consumes the ingress ring buffer, writes the standby
//! partition, reports progress, and reboots on every exit path.
//!
//! Adapted from the firmware crate's `OtaManager` (`rpc::ota`): that type
//! tracked a `Receiving { expected_size, bytes_written }` state machine driven
//! by RPC-dispatched chunks at arbitrary offsets and wrapped `esp-ota`
//! directly. This type is driven by one blocking ring-consumer loop instead,
//! bounded by a counting semaphore rather than an offset check, and has no
//! notion of out-of-order chunks — the ring buffer's single-producer /
//! single-consumer discipline already guarantees submission order. The
//! overflow guard survives the port unchanged: a ring item that would push
//! the running total past the stashed firmware length is rejected before
//! `ota_write` ever sees it.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::config::OtaConfig;
use crate::crc::crc16;
use crate::error::DeviceOtaError;
use crate::framer::DataPacket;

use super::partition::{ImageState, PartitionPort};
use super::ring::ByteRing;
use super::semaphore::CountingSemaphore;

/// Emits one progress percentage, `0..=100`, per flushed ring item.
pub trait ProgressSink {
    fn report(&mut self, pct: u8);
}

pub struct FlashWriter<P: PartitionPort, S: ProgressSink> {
    partition: P,
    progress: S,
    ring: Arc<ByteRing>,
    semaphore: CountingSemaphore,
    config: OtaConfig,
}

impl<P: PartitionPort, S: ProgressSink> FlashWriter<P, S> {
    pub fn new(partition: P, progress: S, ring: Arc<ByteRing>, config: OtaConfig) -> Self {
        Self {
            partition,
            progress,
            ring,
            semaphore: CountingSemaphore::new(100, 1),
            config,
        }
    }

    /// Run the full lifecycle to completion. `fw_length` is the length
    /// stashed from the start command by the characteristic-write handler,
    /// before this task was ever spawned.
    ///
    /// Never returns `Ok` without also having rebooted: every exit path,
    /// success or failure, is followed by `partition.reboot_after(..)`. The
    /// `Result` only distinguishes *why* for logging — the device always
    /// reboots either way.
    pub fn run(mut self, fw_length: u32) -> Result<(), DeviceOtaError> {
        let outcome = self.run_inner(fw_length);
        if let Err(e) = &outcome {
            warn!("flash writer aborting: {e}");
        } else {
            info!("flash writer finished, committing boot partition");
        }
        self.partition.reboot_after(Duration::from_millis(self.config.reboot_delay_ms as u64));
    }

    fn run_inner(&mut self, fw_length: u32) -> Result<(), DeviceOtaError> {
        let (running, state) = self
            .partition
            .running_partition()
            .map_err(|_| DeviceOtaError::PartitionLookup)?;

        if state == ImageState::PendingVerify {
            self.partition
                .mark_valid(running)
                .map_err(|_| DeviceOtaError::PartitionLookup)?;
            info!("rollback cancelled: running partition marked valid");
        }

        if fw_length == 0 {
            return Err(DeviceOtaError::ZeroFirmwareLength);
        }

        let target = self
            .partition
            .standby_partition(running)
            .map_err(|_| DeviceOtaError::PartitionLookup)?;

        let handle = self
            .partition
            .ota_begin(target)
            .map_err(|_| DeviceOtaError::OtaBeginFailed)?;

        let ring_timeout = Duration::from_millis(self.config.ring_recv_timeout_ms as u64);
        let sem_timeout = Duration::from_millis(self.config.semaphore_timeout_ms as u64);

        let mut recv_len: u64 = 0;
        let mut sector_acc: Vec<u8> = Vec::new();
        loop {
            let item = self.ring.recv_timeout(ring_timeout).ok_or(DeviceOtaError::RingRecvTimeout)?;
            let packet = DataPacket::decode(&item).ok_or(DeviceOtaError::MalformedPacket)?;

            sector_acc.extend_from_slice(&packet.payload);
            if packet.is_final() {
                let computed = crc16(&sector_acc);
                if Some(computed) != packet.sector_crc {
                    return Err(DeviceOtaError::SectorCrcMismatch);
                }
                sector_acc.clear();
            }

            if recv_len + packet.payload.len() as u64 > fw_length as u64 {
                return Err(DeviceOtaError::Overflow);
            }

            if !self.semaphore.take(sem_timeout) {
                return Err(DeviceOtaError::SemaphoreTimeout);
            }

            let write_result = self.partition.ota_write(handle, &packet.payload);
            self.semaphore.give();
            write_result.map_err(|_| DeviceOtaError::OtaWriteFailed)?;

            recv_len += packet.payload.len() as u64;
            let pct = ((recv_len * 100) / fw_length as u64).min(100) as u8;
            self.progress.report(pct);

            if recv_len >= fw_length as u64 {
                break;
            }
        }

        self.partition.ota_end(handle).map_err(|_| DeviceOtaError::OtaEndFailed)?;
        self.partition
            .set_boot_partition(target)
            .map_err(|_| DeviceOtaError::OtaEndFailed)?;
        Ok(())
    }
}
