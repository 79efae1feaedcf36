//! Receive path: poll RX status, read the ready buffer, release it.
use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use super::Mcp2515;
use crate::error::ControllerError;
use crate::infra::registers::{
    instruction, register, DLC_MASK, RX0IF, RX1IF, RX_STATUS_EXTENDED, RX_STATUS_RXB0,
    RX_STATUS_RXB1,
};
use crate::protocol::frame::{CanFrame, MAX_DLC};
use crate::protocol::id_codec::IdRegisters;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// The two hardware receive buffers.
pub enum RxBuffer {
    Rxb0,
    Rxb1,
}

impl RxBuffer {
    /// Buffer holding an unread frame according to RX_STATUS; RXB0 is checked first.
    pub fn ready(rx_status: u8) -> Option<Self> {
        if rx_status & RX_STATUS_RXB0 != 0 {
            Some(RxBuffer::Rxb0)
        } else if rx_status & RX_STATUS_RXB1 != 0 {
            Some(RxBuffer::Rxb1)
        } else {
            None
        }
    }

    const fn read_opcode(self) -> u8 {
        match self {
            RxBuffer::Rxb0 => instruction::READ_RXB0_SIDH,
            RxBuffer::Rxb1 => instruction::READ_RXB1_SIDH,
        }
    }

    /// CANINTF flag released after reading the buffer.
    pub const fn interrupt_flag(self) -> u8 {
        match self {
            RxBuffer::Rxb0 => RX0IF,
            RxBuffer::Rxb1 => RX1IF,
        }
    }
}

impl<SPI, D> Mcp2515<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Fetch one pending frame, if any.
    ///
    /// `Ok(None)` is the normal idle answer. When a frame is read, the
    /// buffer's CANINTF flag is cleared last so the chip can refill it.
    pub fn receive(&mut self) -> Result<Option<CanFrame>, ControllerError<SPI::Error>> {
        let rx_status = self.rx_status()?;
        let Some(buffer) = RxBuffer::ready(rx_status) else {
            #[cfg(feature = "defmt")]
            defmt::trace!("No frame pending");
            return Ok(None);
        };

        // SIDH, SIDL, EID8, EID0, DLC, D0..D7
        let raw = self
            .regs
            .read_burst(buffer.read_opcode())
            .map_err(ControllerError::Spi)?;

        let extended = rx_status & RX_STATUS_EXTENDED != 0;
        let id = IdRegisters::from_bytes([raw[0], raw[1], raw[2], raw[3]]).decode(extended);
        let mut data = [0u8; MAX_DLC];
        data.copy_from_slice(&raw[5..]);
        let frame = CanFrame::from_parts(id, extended, raw[4] & DLC_MASK, data);

        self.regs
            .bit_modify(register::CANINTF, buffer.interrupt_flag(), 0x00)
            .map_err(ControllerError::Spi)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Frame {:#X} read from RX buffer {:?}", frame.raw_id(), buffer);
        Ok(Some(frame))
    }
}
