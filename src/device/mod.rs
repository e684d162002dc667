//! Device-side half of the OTA engine: ingress, flash writing, and the
//! rollback-aware boot commit, wired together over a bounded ring buffer.

pub mod boot_commit;
#[cfg(target_os = "espidf")]
pub mod esp_partition;
pub mod flash_writer;
pub mod ingress;
pub mod partition;
pub mod ring;
pub mod semaphore;
mod task_pin;

pub use flash_writer::{FlashWriter, ProgressSink};
pub use ingress::IngressPump;
pub use partition::{FlashHandle, ImageState, PartitionError, PartitionHandle, PartitionPort};
pub use ring::ByteRing;
