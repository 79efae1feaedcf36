//! Register-level access to the MCP2515 over a half-duplex SPI link.
//!
//! Every method is exactly one chip-select-framed transaction: an instruction
//! opcode, then address/data bytes. Responses are taken from the trailing
//! bytes of the full-duplex exchange. No retries and no locking happen here;
//! transport errors are returned untouched to the caller.
use embedded_hal::spi::SpiDevice;

use crate::infra::registers::instruction;

/// Longest instruction-prefixed burst the driver issues
/// (SIDH, SIDL, EID8, EID0, DLC, D0..D7).
pub const MAX_BURST: usize = 13;

/// Thin wrapper owning the SPI device.
pub struct RegisterInterface<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> RegisterInterface<SPI> {
    /// Take ownership of an SPI device already configured for the chip
    /// (mode 0, clock up to 10 MHz).
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Give the SPI device back.
    pub fn release(self) -> SPI {
        self.spi
    }

    /// `[READ, addr, dummy]`, value is the third byte clocked in.
    pub fn read_byte(&mut self, address: u8) -> Result<u8, SPI::Error> {
        let mut buf = [instruction::READ, address, 0x00];
        self.spi.transfer_in_place(&mut buf)?;
        Ok(buf[2])
    }

    /// `[WRITE, addr, value]`.
    pub fn write_byte(&mut self, address: u8, value: u8) -> Result<(), SPI::Error> {
        self.spi.write(&[instruction::WRITE, address, value])
    }

    /// `[BIT_MODIFY, addr, mask, value]`: only bits set in `mask` are changed.
    pub fn bit_modify(&mut self, address: u8, mask: u8, value: u8) -> Result<(), SPI::Error> {
        self.spi
            .write(&[instruction::BIT_MODIFY, address, mask, value])
    }

    /// Single-byte instruction without operands (RESET, RTS).
    pub fn command(&mut self, opcode: u8) -> Result<(), SPI::Error> {
        self.spi.write(&[opcode])
    }

    /// `[READ_STATUS, dummy]`.
    pub fn read_status(&mut self) -> Result<u8, SPI::Error> {
        self.poll(instruction::READ_STATUS)
    }

    /// `[RX_STATUS, dummy]`.
    pub fn rx_status(&mut self) -> Result<u8, SPI::Error> {
        self.poll(instruction::RX_STATUS)
    }

    /// Opcode-prefixed burst write in a single transaction (LOAD TX BUFFER).
    ///
    /// At most [`MAX_BURST`] bytes follow the opcode; anything beyond is dropped.
    pub fn load(&mut self, opcode: u8, bytes: &[u8]) -> Result<(), SPI::Error> {
        let len = bytes.len().min(MAX_BURST);
        let mut buf = [0u8; MAX_BURST + 1];
        buf[0] = opcode;
        buf[1..=len].copy_from_slice(&bytes[..len]);
        self.spi.write(&buf[..=len])
    }

    /// Opcode-prefixed burst read in a single transaction (READ RX BUFFER).
    pub fn read_burst(&mut self, opcode: u8) -> Result<[u8; MAX_BURST], SPI::Error> {
        let mut buf = [0u8; MAX_BURST + 1];
        buf[0] = opcode;
        self.spi.transfer_in_place(&mut buf)?;
        let mut out = [0u8; MAX_BURST];
        out.copy_from_slice(&buf[1..]);
        Ok(out)
    }

    fn poll(&mut self, opcode: u8) -> Result<u8, SPI::Error> {
        let mut buf = [opcode, 0x00];
        self.spi.transfer_in_place(&mut buf)?;
        Ok(buf[1])
    }
}
