//! Change-or-heartbeat publication policy.
//!
//! On every evaluation tick of a perception loop:
//!
//! 1. a value different from the last one sent is transmitted immediately;
//! 2. otherwise, once `heartbeat` has elapsed since the last transmission,
//!    the unchanged value is transmitted again;
//! 3. otherwise nothing is sent.
//!
//! Consumers on the bus can therefore detect a stalled publisher when no
//! frame arrives within one heartbeat. A busy transmit path is not an
//! error: the state is left untouched so the next tick retries.
use embassy_time::{Duration, Instant};

use crate::protocol::controller::transmit::{TxBuffer, TxOutcome};
use crate::protocol::traits::frame_sink::FrameSink;
use crate::telemetry::report::TelemetryPayload;

/// Maximum silence between two frames of one channel (ms).
pub const HEARTBEAT_INTERVAL_MS: u64 = 250;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Publication memory of one logical channel, owned by the perception loop.
pub struct TelemetryState<P> {
    last_sent_value: Option<P>,
    last_sent_at: Instant,
}

impl<P: TelemetryPayload> TelemetryState<P> {
    /// Fresh channel: nothing sent yet, heartbeat clock starting at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            last_sent_value: None,
            last_sent_at: now,
        }
    }

    /// Last value actually handed to the chip (cleared when detection is lost).
    pub fn last_sent_value(&self) -> Option<P> {
        self.last_sent_value
    }

    /// Instant of the last transmission.
    pub fn last_sent_at(&self) -> Instant {
        self.last_sent_at
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Why a value is being transmitted.
pub enum PublishReason {
    /// Differs from the last value sent.
    Changed,
    /// Unchanged, but the heartbeat interval has elapsed.
    Heartbeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Result of one publish tick.
pub enum PublishOutcome {
    /// Frame queued in the given TX buffer.
    Sent {
        reason: PublishReason,
        buffer: TxBuffer,
    },
    /// Nothing due on this tick.
    Held,
    /// A transmission was due but every TX buffer was pending. Retried next tick.
    Busy { reason: PublishReason },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Publication policy shared by all channels of a loop.
pub struct TelemetryPublisher {
    heartbeat: Duration,
}

impl Default for TelemetryPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryPublisher {
    /// Policy with the default heartbeat ([`HEARTBEAT_INTERVAL_MS`]).
    pub const fn new() -> Self {
        Self {
            heartbeat: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
        }
    }

    /// Override the heartbeat interval.
    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn heartbeat(&self) -> Duration {
        self.heartbeat
    }

    /// Pure decision: should `value` be transmitted at `now`?
    ///
    /// `None` (no detection) never triggers a transmission.
    pub fn decide<P: TelemetryPayload>(
        &self,
        state: &TelemetryState<P>,
        value: Option<P>,
        now: Instant,
    ) -> Option<PublishReason> {
        let value = value?;
        if state.last_sent_value != Some(value) {
            Some(PublishReason::Changed)
        } else if now.saturating_duration_since(state.last_sent_at) >= self.heartbeat {
            Some(PublishReason::Heartbeat)
        } else {
            None
        }
    }

    /// Run one tick for a channel: decide, transmit through `sink`, update `state`.
    ///
    /// Losing the detection (`None`) forgets the last value so its return is
    /// published as a change. Transport errors from `sink` are returned;
    /// a busy sink is reported as [`PublishOutcome::Busy`].
    pub fn publish<P, S>(
        &self,
        sink: &mut S,
        state: &mut TelemetryState<P>,
        value: Option<P>,
        now: Instant,
    ) -> Result<PublishOutcome, S::Error>
    where
        P: TelemetryPayload,
        S: FrameSink,
    {
        let Some(value) = value else {
            state.last_sent_value = None;
            return Ok(PublishOutcome::Held);
        };
        let Some(reason) = self.decide(state, Some(value), now) else {
            return Ok(PublishOutcome::Held);
        };

        match sink.send_frame(&value.to_frame())? {
            TxOutcome::Queued(buffer) => {
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "Telemetry {:#X} sent ({:?}) via TX buffer {}",
                    P::CAN_ID,
                    reason,
                    buffer.index()
                );
                state.last_sent_value = Some(value);
                state.last_sent_at = now;
                Ok(PublishOutcome::Sent { reason, buffer })
            }
            TxOutcome::Busy => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Telemetry {:#X} not sent ({:?}): TX buffers busy",
                    P::CAN_ID,
                    reason
                );
                Ok(PublishOutcome::Busy { reason })
            }
        }
    }
}
