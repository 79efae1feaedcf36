//! Telemetry payloads and their CAN encoding.
//!
//! | CAN ID  | byte 0                  | byte 1                       |
//! |---------|-------------------------|------------------------------|
//! | `0x104` | speed code (1..=9) or 0 | stop/light code (10..=13) or 0 |
//! | `0x105` | lane status (1..=4)     | drift status (5..=9)         |
use crate::protocol::frame::{CanFrame, MAX_DLC};
use crate::telemetry::status::{DriftStatus, LaneStatus, TrafficSign};

/// Identifier of the sign / traffic-light channel.
pub const SIGN_CAN_ID: u16 = 0x104;
/// Identifier of the lane / drift channel.
pub const LANE_CAN_ID: u16 = 0x105;

/// A status value that travels as one standard two-byte frame.
pub trait TelemetryPayload: Copy + PartialEq {
    /// Standard identifier of the channel.
    const CAN_ID: u16;

    /// Two payload bytes.
    fn payload(&self) -> [u8; 2];

    /// Decode the payload bytes; `None` for anything outside the contract.
    fn from_payload(bytes: &[u8]) -> Option<Self>;

    /// Frame to hand to the transmit path.
    fn to_frame(&self) -> CanFrame {
        let [first, second] = self.payload();
        let mut data = [0u8; MAX_DLC];
        data[0] = first;
        data[1] = second;
        CanFrame::from_parts(Self::CAN_ID as u32, false, 2, data)
    }

    /// Decode a frame received from the bus, checking the identifier.
    fn from_frame(frame: &CanFrame) -> Option<Self> {
        if frame.is_extended() || frame.raw_id() != Self::CAN_ID as u32 {
            return None;
        }
        Self::from_payload(frame.payload())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Lane visibility and drift, published together on [`LANE_CAN_ID`].
pub struct LaneReport {
    lane: LaneStatus,
    drift: DriftStatus,
}

impl LaneReport {
    /// Combine the two estimates. A significant drift overrides the lane
    /// status with [`LaneStatus::Error`].
    pub fn new(lane: LaneStatus, drift: DriftStatus) -> Self {
        let lane = if drift.is_significant() {
            LaneStatus::Error
        } else {
            lane
        };
        Self { lane, drift }
    }

    pub fn lane(&self) -> LaneStatus {
        self.lane
    }

    pub fn drift(&self) -> DriftStatus {
        self.drift
    }
}

impl TelemetryPayload for LaneReport {
    const CAN_ID: u16 = LANE_CAN_ID;

    fn payload(&self) -> [u8; 2] {
        [self.lane.code(), self.drift.code()]
    }

    fn from_payload(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [lane, drift, ..] => Some(Self {
                lane: LaneStatus::from_code(*lane)?,
                drift: DriftStatus::from_code(*drift)?,
            }),
            _ => None,
        }
    }
}

/// Speed signs go in byte 0, stop sign and lights in byte 1; the other byte stays 0.
impl TelemetryPayload for TrafficSign {
    const CAN_ID: u16 = SIGN_CAN_ID;

    fn payload(&self) -> [u8; 2] {
        if self.is_speed_limit() {
            [self.code(), 0]
        } else {
            [0, self.code()]
        }
    }

    fn from_payload(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0, 0, ..] => None,
            [speed, 0, ..] => TrafficSign::from_code(*speed).filter(|sign| sign.is_speed_limit()),
            [0, sign, ..] => TrafficSign::from_code(*sign).filter(|sign| !sign.is_speed_limit()),
            _ => None,
        }
    }
}
