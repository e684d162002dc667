//! BLE OTA firmware-update protocol engine.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod client;
pub mod config;
pub mod crc;
pub mod device;
pub mod error;
pub mod framer;
