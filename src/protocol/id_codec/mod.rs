//! Mapping between a CAN identifier and the four MCP2515 identifier registers
//! (SIDH, SIDL, EID8, EID0).
//!
//! Register layout (datasheet, TXBnSIDH..TXBnEID0 / RXBnSIDH..RXBnEID0):
//!
//! ```text
//! standard: SIDH = SID10..SID3
//!           SIDL = SID2..SID0 in bits 7:5
//! extended: SIDH = ID28..ID21
//!           SIDL = ID20..ID18 in bits 7:5, EXIDE (0x08), ID17..ID16 in bits 1:0
//!           EID8 = ID15..ID8
//!           EID0 = ID7..ID0
//! ```
//!
//! The layout is fixed by the silicon: one shifted bit corrupts every identifier on the bus.
use crate::infra::registers::SIDL_EXIDE;

/// Largest 11-bit identifier.
pub const MAX_STANDARD_ID: u32 = 0x7FF;
/// Largest 29-bit identifier.
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Identifier registers in wire order.
pub struct IdRegisters {
    pub sidh: u8,
    pub sidl: u8,
    pub eid8: u8,
    pub eid0: u8,
}

impl IdRegisters {
    /// Encode an identifier. Bits above the 11/29-bit range are discarded;
    /// range checks belong to [`CanFrame`](crate::protocol::frame::CanFrame).
    pub fn encode(id: u32, extended: bool) -> Self {
        if extended {
            let id = id & MAX_EXTENDED_ID;
            let upper = id >> 16; // ID28..ID16, 13 bits
            Self {
                sidh: (upper >> 5) as u8,
                sidl: (((upper << 3) & 0xE0) as u8) | SIDL_EXIDE | ((upper & 0x03) as u8),
                eid8: (id >> 8) as u8,
                eid0: id as u8,
            }
        } else {
            let id = id & MAX_STANDARD_ID;
            Self {
                sidh: (id >> 3) as u8,
                sidl: ((id << 5) & 0xFF) as u8,
                eid8: 0,
                eid0: 0,
            }
        }
    }

    /// Inverse of [`encode`](Self::encode). `extended` comes from the chip's
    /// receive status, never from the register contents.
    pub fn decode(&self, extended: bool) -> u32 {
        let sid = ((self.sidh as u32) << 3) | ((self.sidl as u32) >> 5);
        if extended {
            let upper = (sid << 2) | (self.sidl as u32 & 0x03);
            (upper << 16) | ((self.eid8 as u32) << 8) | self.eid0 as u32
        } else {
            sid
        }
    }

    /// Register values as sent in a LOAD TX BUFFER burst.
    pub fn to_bytes(self) -> [u8; 4] {
        [self.sidh, self.sidl, self.eid8, self.eid0]
    }

    /// Registers as read back in a READ RX BUFFER burst.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            sidh: bytes[0],
            sidl: bytes[1],
            eid8: bytes[2],
            eid0: bytes[3],
        }
    }
}
