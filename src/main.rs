//! BLE OTA Engine — Device Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     GATT server (external)                     │
//! │   recv-fw write cb      progress notify      command notify    │
//! │        │                      ▲                    ▲           │
//! │        ▼                      │                    │           │
//! │  ┌───────────┐          ┌───────────┐                          │
//! │  │IngressPump│──ring──▶│FlashWriter│──notifies progress──┘      │
//! │  └───────────┘          └───────────┘                          │
//! │                               │                                │
//! │                       PartitionPort (esp-ota + esp_idf_sys)    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! GATT service registration, write-callback wiring, and notification
//! dispatch are external collaborators per this engine's scope (the BLE
//! stack, pairing, and MTU negotiation are assumed already in place); this
//! entry point bootstraps ESP-IDF, performs the boot-time rollback check,
//! and constructs the ring buffer and ingress pump a GATT server would
//! drive.

#![cfg(feature = "espidf")]

use std::error::Error;
use std::sync::Arc;

use log::info;

use bleota::config::OtaConfig;
use bleota::device::esp_partition::EspPartitionPort;
use bleota::device::{boot_commit, ByteRing, IngressPump};

fn main() -> Result<(), Box<dyn Error>> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  BLE OTA engine v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // Boot-time rollback cancellation: commit this boot even if no OTA
    // session ever runs during it (see device::boot_commit).
    let mut partition = EspPartitionPort::new();
    boot_commit::check_rollback(&mut partition);

    let config = OtaConfig::default();
    let ring = Arc::new(ByteRing::new(config.ring_buffer_capacity));
    let _pump = IngressPump::new(ring, &config);

    info!("OTA engine ready. Awaiting GATT server wiring for recv-fw writes.");

    // The GATT server (external collaborator) drives `_pump.on_write(..)`
    // from the recv-fw write-callback context and, on first invocation,
    // spawns a `FlashWriter` against `EspPartitionPort` and a `ProgressSink`
    // that notifies the progress characteristic.
    #[allow(clippy::empty_loop)]
    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
}
