//! GATT transport abstraction — the client half's only view of the radio.
//!
//! Concrete implementations: a platform BLE central stack (iOS CoreBluetooth,
//! Android BluetoothGatt, or a host-side bluer/btleplug binding). None of
//! those are implemented here — discovery, pairing, and MTU negotiation are
//! external collaborators per the engine's scope. `SessionController` is
//! generic over [`GattTransport`], so swapping platforms requires zero
//! changes to the session logic.

use core::fmt;

/// The four characteristics the engine talks to, identified by role rather
/// than raw UUID so the state machine never juggles magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    /// `0x8020`, client → device, write-with-response + notify.
    RecvFw,
    /// `0x8021`, device → client, notify.
    Progress,
    /// `0x8022`, bidirectional, write-with-response + notify.
    Command,
    /// `0x8023`, bidirectional, notify.
    Customer,
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RecvFw => "recv-fw",
            Self::Progress => "progress",
            Self::Command => "command",
            Self::Customer => "customer",
        };
        write!(f, "{name}")
    }
}

/// One event surfaced by a characteristic subscription.
#[derive(Debug, Clone)]
pub enum GattEvent {
    /// A notification payload arrived on `characteristic`.
    Notification { characteristic: Characteristic, value: Vec<u8> },
    /// The subscription itself failed (not a data-level error).
    SubscriptionError { characteristic: Characteristic, reason: &'static str },
    /// The link dropped.
    Disconnected,
}

/// Connected transport handle: write-with-response plus a single multiplexed
/// notification stream covering whichever characteristics have been
/// subscribed to.
///
/// Mirrors the firmware crate's byte-oriented `Transport` trait, generalized
/// from a single stream to four addressable characteristics and an
/// event-based (rather than poll-based) notification path, since GATT
/// notifications are inherently event-driven.
pub trait GattTransport {
    type Error: fmt::Debug;

    /// Whether all four characteristic handles (`write`, `notify`, `command`,
    /// `customer`) have been resolved. `SessionController` checks this before
    /// doing anything else and fails fast with `ProfileIncomplete` otherwise.
    fn profile_ready(&self) -> bool;

    /// Write `data` to `characteristic` with response, awaiting the
    /// peripheral's write acknowledgement.
    fn write(
        &mut self,
        characteristic: Characteristic,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Subscribe to notifications on `characteristic`. Idempotent per
    /// characteristic; subsequent events arrive through [`Self::next_event`].
    fn subscribe(
        &mut self,
        characteristic: Characteristic,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Remove every subscription installed by this session. Never fails
    /// observably — errors during teardown are logged and dropped per the
    /// mux's contract.
    fn unsubscribe_all(&mut self) -> impl core::future::Future<Output = ()> + Send;

    /// Await the next GATT-level event (notification, subscription error, or
    /// disconnect) across every subscribed characteristic.
    fn next_event(&mut self) -> impl core::future::Future<Output = GattEvent> + Send;
}
