//! In-memory representation of a classic CAN 2.0 data frame.
use embedded_can::{ExtendedId, Id, StandardId};

use crate::error::FrameError;
use crate::protocol::id_codec::{MAX_EXTENDED_ID, MAX_STANDARD_ID};

/// Maximum payload of a classic CAN frame.
pub const MAX_DLC: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// CAN frame as exchanged with the controller.
///
/// Immutable once built: the identifier always fits its 11/29-bit range and
/// `dlc` bounds the valid prefix of `data`.
pub struct CanFrame {
    id: u32,
    extended: bool,
    dlc: u8,
    data: [u8; MAX_DLC],
}

impl CanFrame {
    /// Build a data frame, validating identifier range and payload length.
    pub fn new(id: u32, extended: bool, payload: &[u8]) -> Result<Self, FrameError> {
        let max = if extended {
            MAX_EXTENDED_ID
        } else {
            MAX_STANDARD_ID
        };
        if id > max {
            return Err(FrameError::IdentifierOutOfRange { id, extended });
        }
        if payload.len() > MAX_DLC {
            return Err(FrameError::DataTooLong { len: payload.len() });
        }
        let mut data = [0u8; MAX_DLC];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id,
            extended,
            dlc: payload.len() as u8,
            data,
        })
    }

    /// Standard (11-bit) data frame.
    pub fn standard(id: u16, payload: &[u8]) -> Result<Self, FrameError> {
        Self::new(id as u32, false, payload)
    }

    /// Extended (29-bit) data frame.
    pub fn extended(id: u32, payload: &[u8]) -> Result<Self, FrameError> {
        Self::new(id, true, payload)
    }

    /// Rebuild a frame from the receive path. Identifier bits are masked to
    /// range and a DLC above 8 is clamped, as classic CAN treats 9..15 as 8.
    pub(crate) fn from_parts(id: u32, extended: bool, dlc: u8, data: [u8; MAX_DLC]) -> Self {
        let mask = if extended {
            MAX_EXTENDED_ID
        } else {
            MAX_STANDARD_ID
        };
        Self {
            id: id & mask,
            extended,
            dlc: dlc.min(MAX_DLC as u8),
            data,
        }
    }

    /// Raw identifier value.
    pub fn raw_id(&self) -> u32 {
        self.id
    }

    /// `true` for a 29-bit identifier.
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Data length code (0 to 8).
    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// Valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.dlc as usize]
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(sid) => CanFrame::new(sid.as_raw() as u32, false, data).ok(),
            Id::Extended(eid) => CanFrame::new(eid.as_raw(), true, data).ok(),
        }
    }

    /// The driver only emits data frames.
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.extended
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        // Range is guaranteed by construction, the fallbacks are unreachable.
        if self.extended {
            ExtendedId::new(self.id)
                .map(Id::Extended)
                .unwrap_or(Id::Extended(ExtendedId::ZERO))
        } else {
            StandardId::new(self.id as u16)
                .map(Id::Standard)
                .unwrap_or(Id::Standard(StandardId::ZERO))
        }
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}
