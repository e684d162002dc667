//! Fans the four characteristic subscriptions into typed session events.

use super::transport::{Characteristic, GattEvent, GattTransport};

/// A single decoded event from one of the four subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxEvent {
    /// First notification on `command` after the start command was sent.
    StartAck,
    /// A progress percentage, decoded from the first byte of the notification.
    Progress(u8),
    /// A notification on the write characteristic's echo path.
    WriteEcho,
    /// A notification on the reserved customer characteristic.
    CustomerEcho,
    /// A subscription itself failed.
    SubscriptionError { characteristic: Characteristic, reason: &'static str },
    /// The link dropped.
    Disconnected,
}

/// Subscribes to `notify`, `command`, `write`-echo, and `customer`, and
/// decodes each inbound [`GattEvent`] into a [`MuxEvent`].
///
/// During teardown (`cleanup = true`), [`NotificationMux::poll`] still reads
/// events off the transport (so subscriptions can be drained/removed) but the
/// caller is expected to discard them — per §4.3, "errors during teardown are
/// dropped".
pub struct NotificationMux;

impl NotificationMux {
    /// Subscribe to all four characteristics used by the OTA session.
    pub async fn subscribe_all<T: GattTransport>(transport: &mut T) -> Result<(), T::Error> {
        transport.subscribe(Characteristic::Progress).await?;
        transport.subscribe(Characteristic::Command).await?;
        // The client subscribes to recv-fw purely to surface GATT-layer
        // errors; whether the peer ever notifies on it is unspecified, and
        // both behaviors are tolerated by `decode` below (§9, open question).
        transport.subscribe(Characteristic::RecvFw).await?;
        transport.subscribe(Characteristic::Customer).await?;
        Ok(())
    }

    /// Await and decode the next event from `transport`.
    pub async fn next<T: GattTransport>(transport: &mut T) -> MuxEvent {
        Self::decode(transport.next_event().await)
    }

    fn decode(event: GattEvent) -> MuxEvent {
        match event {
            GattEvent::Notification { characteristic, value } => match characteristic {
                Characteristic::Command => MuxEvent::StartAck,
                Characteristic::Progress => {
                    MuxEvent::Progress(value.first().copied().unwrap_or(0))
                }
                Characteristic::RecvFw => MuxEvent::WriteEcho,
                Characteristic::Customer => MuxEvent::CustomerEcho,
            },
            GattEvent::SubscriptionError { characteristic, reason } => {
                MuxEvent::SubscriptionError { characteristic, reason }
            }
            GattEvent::Disconnected => MuxEvent::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_payload_is_first_byte() {
        let event = GattEvent::Notification {
            characteristic: Characteristic::Progress,
            value: vec![42, 0, 0],
        };
        assert_eq!(NotificationMux::decode(event), MuxEvent::Progress(42));
    }

    #[test]
    fn empty_progress_payload_decodes_to_zero() {
        let event = GattEvent::Notification {
            characteristic: Characteristic::Progress,
            value: vec![],
        };
        assert_eq!(NotificationMux::decode(event), MuxEvent::Progress(0));
    }

    #[test]
    fn command_notification_is_start_ack() {
        let event = GattEvent::Notification {
            characteristic: Characteristic::Command,
            value: vec![],
        };
        assert_eq!(NotificationMux::decode(event), MuxEvent::StartAck);
    }

    #[test]
    fn recv_fw_notification_is_write_echo() {
        let event = GattEvent::Notification {
            characteristic: Characteristic::RecvFw,
            value: vec![],
        };
        assert_eq!(NotificationMux::decode(event), MuxEvent::WriteEcho);
    }

    #[test]
    fn subscription_error_passes_through() {
        let event = GattEvent::SubscriptionError {
            characteristic: Characteristic::Customer,
            reason: "gatt busy",
        };
        assert_eq!(
            NotificationMux::decode(event),
            MuxEvent::SubscriptionError {
                characteristic: Characteristic::Customer,
                reason: "gatt busy"
            }
        );
    }

    #[test]
    fn disconnect_passes_through() {
        assert_eq!(
            NotificationMux::decode(GattEvent::Disconnected),
            MuxEvent::Disconnected
        );
    }
}
