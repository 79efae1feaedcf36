//! Transmit path: pick a free TX buffer, load it in one burst, request transmission.
use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use super::Mcp2515;
use crate::error::ControllerError;
use crate::infra::registers::{instruction, TXB0REQ, TXB1REQ, TXB2REQ};
use crate::infra::spi::MAX_BURST;
use crate::protocol::frame::CanFrame;
use crate::protocol::id_codec::IdRegisters;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// The three hardware transmit buffers.
pub enum TxBuffer {
    Txb0,
    Txb1,
    Txb2,
}

impl TxBuffer {
    /// Scan order used by [`Mcp2515::send`]: the lowest free index wins.
    pub const PRIORITY: [TxBuffer; 3] = [TxBuffer::Txb0, TxBuffer::Txb1, TxBuffer::Txb2];

    /// Buffer index (0, 1, 2).
    pub const fn index(self) -> u8 {
        match self {
            TxBuffer::Txb0 => 0,
            TxBuffer::Txb1 => 1,
            TxBuffer::Txb2 => 2,
        }
    }

    const fn load_opcode(self) -> u8 {
        match self {
            TxBuffer::Txb0 => instruction::LOAD_TXB0_SIDH,
            TxBuffer::Txb1 => instruction::LOAD_TXB1_SIDH,
            TxBuffer::Txb2 => instruction::LOAD_TXB2_SIDH,
        }
    }

    const fn rts_opcode(self) -> u8 {
        match self {
            TxBuffer::Txb0 => instruction::RTS_TX0,
            TxBuffer::Txb1 => instruction::RTS_TX1,
            TxBuffer::Txb2 => instruction::RTS_TX2,
        }
    }

    /// TXBnREQ bit in the READ_STATUS response.
    pub const fn pending_mask(self) -> u8 {
        match self {
            TxBuffer::Txb0 => TXB0REQ,
            TxBuffer::Txb1 => TXB1REQ,
            TxBuffer::Txb2 => TXB2REQ,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Observable state of a TX buffer. Always derived from a fresh status read:
/// the chip clears the pending bit on its own when transmission completes.
pub enum TxSlotState {
    Free,
    Pending,
}

impl TxSlotState {
    /// State of `buffer` in a READ_STATUS snapshot.
    pub fn from_status(status: u8, buffer: TxBuffer) -> Self {
        if status & buffer.pending_mask() == 0 {
            TxSlotState::Free
        } else {
            TxSlotState::Pending
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Result of a send attempt. `Busy` is an expected outcome, not an error.
pub enum TxOutcome {
    /// Frame loaded and transmission requested in this buffer.
    Queued(TxBuffer),
    /// All three buffers were pending; nothing was written.
    Busy,
}

impl TxOutcome {
    /// `true` when the frame was handed to the chip.
    pub fn is_queued(&self) -> bool {
        matches!(self, TxOutcome::Queued(_))
    }
}

impl<SPI, D> Mcp2515<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Queue `frame` in the first free TX buffer (order 0, 1, 2).
    ///
    /// Reads the status once. When every buffer is pending, returns
    /// [`TxOutcome::Busy`] without any further transaction; retrying is up to the caller.
    pub fn send(&mut self, frame: &CanFrame) -> Result<TxOutcome, ControllerError<SPI::Error>> {
        let status = self.read_status()?;

        let free = TxBuffer::PRIORITY
            .iter()
            .copied()
            .find(|buffer| TxSlotState::from_status(status, *buffer) == TxSlotState::Free);

        match free {
            Some(buffer) => {
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "TX buffer {} selected for id {:#X}",
                    buffer.index(),
                    frame.raw_id()
                );
                self.load_tx_buffer(buffer, frame)?;
                self.request_to_send(buffer)?;
                Ok(TxOutcome::Queued(buffer))
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("All TX buffers pending, frame {:#X} not queued", frame.raw_id());
                Ok(TxOutcome::Busy)
            }
        }
    }

    /// Build a data frame from raw parts and [`send`](Self::send) it.
    ///
    /// An identifier outside its 11/29-bit range or a payload longer than
    /// eight bytes is rejected with [`ControllerError::InvalidFrame`] before
    /// any SPI transaction.
    pub fn send_data(
        &mut self,
        id: u32,
        extended: bool,
        payload: &[u8],
    ) -> Result<TxOutcome, ControllerError<SPI::Error>> {
        let frame = CanFrame::new(id, extended, payload)?;
        self.send(&frame)
    }

    /// Write identifier, DLC, and payload of `frame` into `buffer` with a single
    /// LOAD TX BUFFER burst. Does not request transmission.
    pub fn load_tx_buffer(
        &mut self,
        buffer: TxBuffer,
        frame: &CanFrame,
    ) -> Result<(), ControllerError<SPI::Error>> {
        let payload = frame.payload();
        let id = IdRegisters::encode(frame.raw_id(), frame.is_extended());
        let mut burst = [0u8; MAX_BURST];
        burst[..4].copy_from_slice(&id.to_bytes());
        burst[4] = frame.dlc();
        burst[5..5 + payload.len()].copy_from_slice(payload);

        self.regs
            .load(buffer.load_opcode(), &burst[..5 + payload.len()])
            .map_err(ControllerError::Spi)
    }

    /// RTS for one buffer.
    pub fn request_to_send(&mut self, buffer: TxBuffer) -> Result<(), ControllerError<SPI::Error>> {
        self.regs
            .command(buffer.rts_opcode())
            .map_err(ControllerError::Spi)
    }

    /// RTS for all three buffers at once.
    pub fn request_to_send_all(&mut self) -> Result<(), ControllerError<SPI::Error>> {
        self.regs
            .command(instruction::RTS_ALL)
            .map_err(ControllerError::Spi)
    }

    /// Fresh state of one TX buffer.
    pub fn tx_slot_state(
        &mut self,
        buffer: TxBuffer,
    ) -> Result<TxSlotState, ControllerError<SPI::Error>> {
        let status = self.read_status()?;
        Ok(TxSlotState::from_status(status, buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// Pending bits follow the READ_STATUS layout (TXB0REQ, TXB1REQ, TXB2REQ).
    fn test_slot_state_from_status() {
        let status = TXB0REQ | TXB2REQ;
        assert_eq!(TxSlotState::from_status(status, TxBuffer::Txb0), TxSlotState::Pending);
        assert_eq!(TxSlotState::from_status(status, TxBuffer::Txb1), TxSlotState::Free);
        assert_eq!(TxSlotState::from_status(status, TxBuffer::Txb2), TxSlotState::Pending);
        // Interrupt flags (TXnIF, RXnIF) do not mark a buffer as pending.
        assert_eq!(TxSlotState::from_status(0xAB, TxBuffer::Txb0), TxSlotState::Free);
    }
}
