//! `BootCommit` — rollback cancellation at boot.
//!
//! The ESP-IDF bootloader itself enforces the `PENDING_VERIFY` → rollback
//! contract: a partition that boots in `PENDING_VERIFY` and is never marked
//! `VALID` gets rolled back on the next reset. `FlashWriter::run_inner`
//! cancels rollback implicitly on its own first invocation (§4.6 step 1), but
//! that only happens if a new OTA session actually starts. This call site,
//! adapted from the firmware crate's unconditional `check_rollback()` at
//! `main()` entry, commits the boot promptly even when no OTA ever runs —
//! otherwise a device that boots successfully but is never re-flashed would
//! sit in `PENDING_VERIFY` until the next OTA happens to cancel it.

use log::{info, warn};

use super::partition::{ImageState, PartitionPort};

/// Mark the running partition `Valid` if it is still `PendingVerify`. A
/// no-op (and not an error) if it is already `Valid`. Call once at startup,
/// before any OTA session is possible.
pub fn check_rollback<P: PartitionPort>(partition: &mut P) {
    let (running, state) = match partition.running_partition() {
        Ok(pair) => pair,
        Err(e) => {
            warn!("boot commit: running partition lookup failed: {e}");
            return;
        }
    };

    match state {
        ImageState::PendingVerify => match partition.mark_valid(running) {
            Ok(()) => info!("boot commit: rollback cancelled"),
            Err(e) => warn!("boot commit: mark_valid failed: {e}"),
        },
        _ => info!("boot commit: running partition already {:?}, nothing to commit", state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::partition::{FlashHandle, PartitionError, PartitionHandle};
    use core::time::Duration;

    struct FakePartition {
        state: ImageState,
        marked: Vec<PartitionHandle>,
    }

    impl PartitionPort for FakePartition {
        fn running_partition(&self) -> Result<(PartitionHandle, ImageState), PartitionError> {
            Ok((PartitionHandle(0), self.state))
        }

        fn mark_valid(&mut self, handle: PartitionHandle) -> Result<(), PartitionError> {
            self.marked.push(handle);
            self.state = ImageState::Valid;
            Ok(())
        }

        fn standby_partition(&self, running: PartitionHandle) -> Result<PartitionHandle, PartitionError> {
            Ok(PartitionHandle(1 - running.0))
        }

        fn ota_begin(&mut self, _target: PartitionHandle) -> Result<FlashHandle, PartitionError> {
            unreachable!("boot commit never writes flash")
        }

        fn ota_write(&mut self, _handle: FlashHandle, _data: &[u8]) -> Result<(), PartitionError> {
            unreachable!("boot commit never writes flash")
        }

        fn ota_end(&mut self, _handle: FlashHandle) -> Result<(), PartitionError> {
            unreachable!("boot commit never writes flash")
        }

        fn set_boot_partition(&mut self, _target: PartitionHandle) -> Result<(), PartitionError> {
            unreachable!("boot commit never sets boot partition")
        }

        fn reboot_after(&self, _delay: Duration) -> ! {
            unreachable!("boot commit never reboots")
        }
    }

    #[test]
    fn pending_verify_becomes_valid() {
        let mut partition = FakePartition { state: ImageState::PendingVerify, marked: Vec::new() };
        check_rollback(&mut partition);
        assert_eq!(partition.state, ImageState::Valid);
        assert_eq!(partition.marked, vec![PartitionHandle(0)]);
    }

    #[test]
    fn already_valid_is_left_untouched() {
        let mut partition = FakePartition { state: ImageState::Valid, marked: Vec::new() };
        check_rollback(&mut partition);
        assert!(partition.marked.is_empty());
    }
}
