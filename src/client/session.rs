//! `SessionController` — owns the end-to-end client OTA session lifecycle.

use core::time::Duration;

use crate::config::OtaConfig;
use crate::error::OtaError;
use crate::framer;

use super::notify_mux::{MuxEvent, NotificationMux};
use super::progress::ProgressTracker;
use super::transport::{Characteristic, GattTransport};

/// Client-side session state. A tagged enum rather than a function-pointer
/// table, since two of its variants carry data the table-driven FSM used
/// elsewhere in this codebase has no room for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingStartAck,
    Streaming { sector: u16, seq: u8 },
    AwaitingFinalProgress,
    Done,
    Failed { reason: OtaError },
}

/// Drives one firmware transfer over a [`GattTransport`].
///
/// One controller is meant to live for the duration of a single connection;
/// `run_ota` may be called repeatedly, but only one call is ever in flight —
/// a second concurrent call observes `state != Idle` and fails with
/// [`OtaError::Busy`] without touching the transport.
pub struct SessionController<T: GattTransport> {
    transport: T,
    config: OtaConfig,
    progress: ProgressTracker,
    state: SessionState,
}

impl<T: GattTransport> SessionController<T> {
    pub fn new(transport: T, config: OtaConfig) -> Self {
        Self {
            transport,
            config,
            progress: ProgressTracker::new(),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Progress tracker for this session, shared with whatever UI layer wants
    /// to observe it independently of `run_ota`'s return value.
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Transfer `image` to the device, `chunk_size` bytes per data packet.
    pub async fn run_ota(&mut self, image: &[u8], chunk_size: u16) -> Result<(), OtaError> {
        if self.state != SessionState::Idle {
            self.state = SessionState::Failed { reason: OtaError::Busy };
            return Err(OtaError::Busy);
        }

        let result = self.run_ota_inner(image, chunk_size).await;
        self.teardown().await;

        match &result {
            Ok(()) => self.state = SessionState::Done,
            Err(e) => self.state = SessionState::Failed { reason: e.clone() },
        }
        result
    }

    async fn run_ota_inner(&mut self, image: &[u8], chunk_size: u16) -> Result<(), OtaError> {
        if !self.transport.profile_ready() {
            return Err(OtaError::ProfileIncomplete);
        }

        NotificationMux::subscribe_all(&mut self.transport)
            .await
            .map_err(|_| OtaError::ProfileIncomplete)?;

        let length = image.len() as u32;
        let start_cmd = framer::make_start_command(length);
        self.transport
            .write(Characteristic::Command, &start_cmd)
            .await
            .map_err(|_| OtaError::Disconnected)?;

        self.state = SessionState::AwaitingStartAck;
        self.await_start_ack().await?;

        let num_sectors = framer::num_sectors(length);

        // An empty image never streams a sector, so there is no "expected
        // sector progress" to wait for — only the ordinary per-sector stall
        // detector applies (the device aborts immediately on zero length and
        // never emits any progress at all).
        if num_sectors == 0 {
            self.state = SessionState::AwaitingFinalProgress;
            return self
                .wait_for_progress(100, self.config.progress_wait_timeout_ms, OtaError::ProgressStall)
                .await;
        }

        let mut emitted_bytes: u64 = 0;
        for sector in 0..num_sectors {
            let range = framer::sector_range(sector, length);
            let sector_bytes = &image[range.start as usize..range.end as usize];
            let packets = framer::plan_sector_packets(sector as u16, sector_bytes, chunk_size);

            for packet in &packets {
                self.state = SessionState::Streaming {
                    sector: sector as u16,
                    seq: packet.seq,
                };
                self.transport
                    .write(Characteristic::RecvFw, &packet.encode())
                    .await
                    .map_err(|_| OtaError::Disconnected)?;
            }

            emitted_bytes += sector_bytes.len() as u64;
            let expected_pct = if length == 0 {
                100
            } else {
                ((emitted_bytes * 100) / length as u64) as u8
            };
            self.wait_for_progress(expected_pct, self.config.progress_wait_timeout_ms, OtaError::ProgressStall)
                .await?;
        }

        self.state = SessionState::AwaitingFinalProgress;
        self.wait_for_progress(100, self.config.final_progress_timeout_ms, OtaError::FinalProgressTimeout)
            .await?;

        Ok(())
    }

    async fn await_start_ack(&mut self) -> Result<(), OtaError> {
        let timeout = Duration::from_millis(self.config.start_ack_timeout_ms as u64);
        futures_lite::future::or(
            async {
                loop {
                    match NotificationMux::next(&mut self.transport).await {
                        MuxEvent::StartAck => return Ok(()),
                        MuxEvent::SubscriptionError { characteristic, reason } => {
                            return Err(OtaError::SubscriptionError { characteristic, reason });
                        }
                        MuxEvent::Disconnected => return Err(OtaError::Disconnected),
                        MuxEvent::Progress(p) => self.progress.update(p),
                        MuxEvent::WriteEcho | MuxEvent::CustomerEcho => {}
                    }
                }
            },
            async {
                async_io_mini::Timer::after(timeout).await;
                Err(OtaError::StartTimeout)
            },
        )
        .await
    }

    /// Gates on [`ProgressTracker::wait_for`] — the pump below only ever
    /// feeds it notifications, never decides satisfaction itself.
    async fn wait_for_progress(
        &mut self,
        threshold: u8,
        timeout_ms: u32,
        on_timeout: OtaError,
    ) -> Result<(), OtaError> {
        let timeout = Duration::from_millis(timeout_ms as u64);
        let waiter = self.progress.wait_for(threshold);
        let pump = async {
            loop {
                match NotificationMux::next(&mut self.transport).await {
                    MuxEvent::Progress(p) => self.progress.update(p),
                    MuxEvent::SubscriptionError { characteristic, reason } => {
                        return Err(OtaError::SubscriptionError { characteristic, reason });
                    }
                    MuxEvent::Disconnected => return Err(OtaError::Disconnected),
                    MuxEvent::StartAck | MuxEvent::WriteEcho | MuxEvent::CustomerEcho => {}
                }
            }
        };
        futures_lite::future::or(
            futures_lite::future::or(waiter, pump),
            async {
                async_io_mini::Timer::after(timeout).await;
                Err(on_timeout)
            },
        )
        .await
    }

    /// Always-run teardown: remove subscriptions, reject pending progress
    /// waiters, clear held state. Safe to call more than once — the second
    /// call finds nothing left to tear down.
    async fn teardown(&mut self) {
        self.progress.reject_all(OtaError::Disconnected);
        self.transport.unsubscribe_all().await;
    }
}
