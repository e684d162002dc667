//! Partition-table port: the device half's only view of flash.
//!
//! Mirrors the shape of [`crate::client::transport::GattTransport`] — a trait
//! boundary generalized from the firmware crate's `esp-ota`-backed
//! `OtaManager`, adapted from its byte-offset chunked-write model to this
//! protocol's sector/semaphore model. A real implementation wraps
//! `esp_ota::{OtaUpdate, ...}`; tests use an in-memory double.
//!
//! Out of scope here: partition table parsing and app-image header
//! verification, both assumed handled by the ESP-IDF bootloader per the
//! engine's scope.

use core::fmt;

/// Rollback image-state lattice ESP-IDF attaches to each OTA slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    New,
    PendingVerify,
    Valid,
    Invalid,
    Aborted,
}

/// Opaque handle to one of the two app slots (`OTA_0`, `OTA_1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionHandle(pub u8);

/// Opaque handle returned by `ota_begin`, consumed by `ota_write`/`ota_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionError {
    NotAppPartition,
    NoStandbySlot,
    BeginFailed,
    WriteFailed,
    EndFailed,
    SetBootFailed,
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAppPartition => write!(f, "running partition is not app-type"),
            Self::NoStandbySlot => write!(f, "no standby partition available"),
            Self::BeginFailed => write!(f, "ota_begin failed"),
            Self::WriteFailed => write!(f, "ota_write failed"),
            Self::EndFailed => write!(f, "ota_end failed"),
            Self::SetBootFailed => write!(f, "set_boot_partition failed"),
        }
    }
}

/// Flash-partition API the device half depends on. Every method is
/// synchronous and blocking — `FlashWriter` runs on its own dedicated task,
/// so blocking here never stalls the BLE stack.
pub trait PartitionPort {
    /// The currently running (booted) partition and its image state.
    fn running_partition(&self) -> Result<(PartitionHandle, ImageState), PartitionError>;

    /// Mark `handle` as `Valid`, cancelling rollback.
    fn mark_valid(&mut self, handle: PartitionHandle) -> Result<(), PartitionError>;

    /// The standby partition (the one that is not `handle`).
    fn standby_partition(&self, running: PartitionHandle) -> Result<PartitionHandle, PartitionError>;

    fn ota_begin(&mut self, target: PartitionHandle) -> Result<FlashHandle, PartitionError>;
    fn ota_write(&mut self, handle: FlashHandle, data: &[u8]) -> Result<(), PartitionError>;
    fn ota_end(&mut self, handle: FlashHandle) -> Result<(), PartitionError>;
    fn set_boot_partition(&mut self, target: PartitionHandle) -> Result<(), PartitionError>;

    /// Delay then reboot. Never returns.
    fn reboot_after(&self, delay: core::time::Duration) -> !;
}
