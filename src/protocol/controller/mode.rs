//! Operation-mode state machine: RESET, then verified transitions between
//! Configuration, Normal, and Sleep.
use embassy_time::Duration;
use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use super::Mcp2515;
use crate::error::ControllerError;
use crate::infra::registers::{instruction, register, MODE_MASK};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Chip operation modes used by the driver.
pub enum OperationMode {
    /// Bus-active.
    Normal,
    /// Low power, bus inactive.
    Sleep,
    /// Register setup allowed (bit timing, filters). Entered after reset.
    Configuration,
}

impl OperationMode {
    /// REQOP / OPMOD value (bits 7:5 of CANCTRL / CANSTAT).
    pub const fn bits(self) -> u8 {
        match self {
            OperationMode::Normal => 0x00,
            OperationMode::Sleep => 0x20,
            OperationMode::Configuration => 0x80,
        }
    }

    /// Decode the OPMOD field of CANSTAT. Loopback and listen-only read as `None`.
    pub fn from_status(canstat: u8) -> Option<Self> {
        match canstat & MODE_MASK {
            0x00 => Some(OperationMode::Normal),
            0x20 => Some(OperationMode::Sleep),
            0x80 => Some(OperationMode::Configuration),
            _ => None,
        }
    }
}

/// Milliseconds for `DelayNs::delay_ms`, saturating at `u32::MAX`.
fn clamped_millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

impl<SPI, D> Mcp2515<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Issue RESET and wait the settle time. No register access is valid before it elapses.
    pub fn reset(&mut self) -> Result<(), ControllerError<SPI::Error>> {
        self.regs
            .command(instruction::RESET)
            .map_err(ControllerError::Spi)?;
        self.delay.delay_ms(clamped_millis(self.config.reset_settle));
        self.mode = OperationMode::Configuration;
        self.initialized = false;

        #[cfg(feature = "defmt")]
        defmt::debug!("MCP2515 reset");
        Ok(())
    }

    /// Request `mode` through CANCTRL and poll CANSTAT until it reports it.
    ///
    /// Polls at most `mode_poll_attempts` times, pausing `mode_poll_interval`
    /// after each miss. On exhaustion the recorded mode is left untouched and
    /// [`ControllerError::ModeTimeout`] is returned; nothing is retried.
    pub fn set_mode(&mut self, mode: OperationMode) -> Result<(), ControllerError<SPI::Error>> {
        self.regs
            .write_byte(register::CANCTRL, mode.bits())
            .map_err(ControllerError::Spi)?;

        let attempts = self.config.mode_poll_attempts;
        let interval = clamped_millis(self.config.mode_poll_interval);
        for _ in 0..attempts {
            let canstat = self
                .regs
                .read_byte(register::CANSTAT)
                .map_err(ControllerError::Spi)?;
            if canstat & MODE_MASK == mode.bits() {
                self.mode = mode;
                #[cfg(feature = "defmt")]
                defmt::info!("MCP2515 entered {:?} mode", mode);
                return Ok(());
            }
            self.delay.delay_ms(interval);
        }

        #[cfg(feature = "defmt")]
        defmt::warn!(
            "MCP2515 did not confirm {:?} mode after {} polls",
            mode,
            attempts
        );
        Err(ControllerError::ModeTimeout {
            requested: mode,
            attempts,
        })
    }

    /// Verified transition to Sleep.
    pub fn sleep(&mut self) -> Result<(), ControllerError<SPI::Error>> {
        self.set_mode(OperationMode::Sleep)
    }

    /// Verified transition back to Normal.
    pub fn wake(&mut self) -> Result<(), ControllerError<SPI::Error>> {
        self.set_mode(OperationMode::Normal)
    }

    /// Last mode confirmed by CANSTAT (or implied by reset).
    pub fn current_mode(&self) -> OperationMode {
        self.mode
    }

    /// Read CANSTAT and decode the mode the chip reports right now.
    pub fn reported_mode(&mut self) -> Result<Option<OperationMode>, ControllerError<SPI::Error>> {
        self.regs
            .read_byte(register::CANSTAT)
            .map(OperationMode::from_status)
            .map_err(ControllerError::Spi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// OPMOD decoding ignores the low CANSTAT bits.
    fn test_from_status_masks_low_bits() {
        assert_eq!(
            OperationMode::from_status(0x8E),
            Some(OperationMode::Configuration)
        );
        assert_eq!(OperationMode::from_status(0x2C), Some(OperationMode::Sleep));
        assert_eq!(OperationMode::from_status(0x01), Some(OperationMode::Normal));
        assert_eq!(OperationMode::from_status(0x40), None);
    }

    #[test]
    /// Delays longer than `u32::MAX` ms saturate instead of wrapping.
    fn test_clamped_millis() {
        assert_eq!(clamped_millis(Duration::from_millis(10)), 10);
        assert_eq!(
            clamped_millis(Duration::from_millis(u32::MAX as u64 + 5)),
            u32::MAX
        );
    }

    #[test]
    /// Encoding and decoding agree for every mode.
    fn test_bits_round_trip() {
        for mode in [
            OperationMode::Normal,
            OperationMode::Sleep,
            OperationMode::Configuration,
        ] {
            assert_eq!(OperationMode::from_status(mode.bits()), Some(mode));
        }
    }
}
