//! Unified error types for both halves of the OTA engine.
//!
//! Client and device run in disjoint process contexts and never share an
//! error type; each gets its own closed enum, following the firmware crate's
//! convention of a flat, `Copy`-able enum per subsystem rather than a boxed
//! `dyn Error`.

use core::fmt;

// ---------------------------------------------------------------------------
// Client-side errors
// ---------------------------------------------------------------------------

/// Every way `SessionController::run_ota` can fail.
///
/// All variants are terminal for the current session — teardown always runs,
/// there is no automatic retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtaError {
    /// One or more of the four required characteristic handles is missing.
    ProfileIncomplete,
    /// No start-ack notification arrived within the 3 s window.
    StartTimeout,
    /// Progress didn't reach the expected threshold for a sector within 5 s.
    ProgressStall,
    /// Progress didn't reach 100 within 5 s of the last sector being sent.
    FinalProgressTimeout,
    /// A GATT subscription reported an error.
    SubscriptionError {
        characteristic: crate::client::transport::Characteristic,
        reason: &'static str,
    },
    /// The link dropped before the session reached `Done`.
    Disconnected,
    /// A session was already in progress on this connection.
    Busy,
}

impl fmt::Display for OtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProfileIncomplete => write!(f, "required characteristic missing"),
            Self::StartTimeout => write!(f, "no start ack within 3000ms"),
            Self::ProgressStall => write!(f, "progress stalled before reaching expected threshold"),
            Self::FinalProgressTimeout => write!(f, "progress never reached 100"),
            Self::SubscriptionError { characteristic, reason } => {
                write!(f, "subscription error on {characteristic}: {reason}")
            }
            Self::Disconnected => write!(f, "device disconnected mid-session"),
            Self::Busy => write!(f, "a session is already in progress"),
        }
    }
}

impl std::error::Error for OtaError {}

// ---------------------------------------------------------------------------
// Device-side errors
// ---------------------------------------------------------------------------

/// Every way the device-side receiver aborts. Every variant leads to a 2 s
/// delay followed by a reboot; the running partition is never touched by a
/// failed OTA, so the device always comes back up bootable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOtaError {
    RingInit,
    BtInit,
    OtaHostInit,
    PartitionLookup,
    OtaBeginFailed,
    OtaWriteFailed,
    OtaEndFailed,
    RingRecvTimeout,
    SemaphoreTimeout,
    ZeroFirmwareLength,
    MalformedPacket,
    SectorCrcMismatch,
    Overflow,
}

impl fmt::Display for DeviceOtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RingInit => write!(f, "ring buffer initialization failed"),
            Self::BtInit => write!(f, "BT controller init/enable failed"),
            Self::OtaHostInit => write!(f, "OTA host initialization failed"),
            Self::PartitionLookup => write!(f, "partition lookup failed"),
            Self::OtaBeginFailed => write!(f, "ota_begin failed"),
            Self::OtaWriteFailed => write!(f, "ota_write failed"),
            Self::OtaEndFailed => write!(f, "ota_end failed"),
            Self::RingRecvTimeout => write!(f, "ring-receive timed out after 10000ms"),
            Self::SemaphoreTimeout => write!(f, "semaphore-take timed out after 10000ms"),
            Self::ZeroFirmwareLength => write!(f, "firmware length stashed from start command is zero"),
            Self::MalformedPacket => write!(f, "ring item too short to be a valid data packet"),
            Self::SectorCrcMismatch => write!(f, "sector CRC trailer did not match the received bytes"),
            Self::Overflow => write!(f, "ring item would write past the stashed firmware length"),
        }
    }
}

impl std::error::Error for DeviceOtaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            OtaError::Busy.to_string(),
            "a session is already in progress"
        );
        assert_eq!(
            DeviceOtaError::ZeroFirmwareLength.to_string(),
            "firmware length stashed from start command is zero"
        );
    }
}
