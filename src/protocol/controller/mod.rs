//! MCP2515 controller handle.
//!
//! The handle owns the SPI link, the delay provider, and the last confirmed
//! operation mode. Every public method is a blocking sequence of SPI
//! transactions; callers sharing one chip between tasks must serialize whole
//! sequences (see [`SharedController`](crate::protocol::shared::SharedController)).
//!
//! Typical bring-up:
//!
//! ```rust,ignore
//! let mut can = Mcp2515::new(spi, delay);
//! can.initialize(BitRateProfile::Kbps1000)?;
//! let frame = CanFrame::standard(0x123, &[1, 2, 3, 4])?;
//! match can.send(&frame)? {
//!     TxOutcome::Queued(buffer) => { /* on the wire soon */ }
//!     TxOutcome::Busy => { /* retry on the next cycle */ }
//! }
//! ```
use embassy_time::Duration;
use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use crate::error::ControllerError;
use crate::infra::registers::{register, BUKT_ROLLOVER, RX0IF, RX1IF, RXM_ACCEPT_ALL};
use crate::infra::spi::RegisterInterface;

pub mod bit_rate;
pub mod mode;
pub mod receive;
pub mod transmit;

use bit_rate::BitRateProfile;
use mode::OperationMode;

/// Number of CANSTAT polls before a mode change is declared failed.
pub const MODE_POLL_ATTEMPTS: u8 = 10;
/// Delay between two CANSTAT polls (ms).
pub const MODE_POLL_INTERVAL_MS: u64 = 10;
/// Settle time after the RESET instruction before any register access (ms).
pub const RESET_SETTLE_MS: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Timing knobs of the driver. Defaults reproduce the field-proven values.
pub struct ControllerConfig {
    /// CANSTAT polls per mode change.
    pub mode_poll_attempts: u8,
    /// Pause after each unsuccessful poll.
    pub mode_poll_interval: Duration,
    /// Pause after RESET.
    pub reset_settle: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode_poll_attempts: MODE_POLL_ATTEMPTS,
            mode_poll_interval: Duration::from_millis(MODE_POLL_INTERVAL_MS),
            reset_settle: Duration::from_millis(RESET_SETTLE_MS),
        }
    }
}

impl ControllerConfig {
    /// Override the number of CANSTAT polls.
    pub fn with_mode_poll_attempts(mut self, attempts: u8) -> Self {
        self.mode_poll_attempts = attempts;
        self
    }

    /// Override the pause between CANSTAT polls.
    pub fn with_mode_poll_interval(mut self, interval: Duration) -> Self {
        self.mode_poll_interval = interval;
        self
    }

    /// Override the post-reset settle time.
    pub fn with_reset_settle(mut self, settle: Duration) -> Self {
        self.reset_settle = settle;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Snapshot of the EFLG register.
pub struct ErrorFlags(pub u8);

impl ErrorFlags {
    /// RXB1 overflowed.
    pub fn rx1_overflow(&self) -> bool {
        self.0 & 0x80 != 0
    }
    /// RXB0 overflowed.
    pub fn rx0_overflow(&self) -> bool {
        self.0 & 0x40 != 0
    }
    /// Transmit error counter reached 255: the node left the bus.
    pub fn bus_off(&self) -> bool {
        self.0 & 0x20 != 0
    }
    /// Transmit error counter at or above 128.
    pub fn tx_error_passive(&self) -> bool {
        self.0 & 0x10 != 0
    }
    /// Receive error counter at or above 128.
    pub fn rx_error_passive(&self) -> bool {
        self.0 & 0x08 != 0
    }
    /// Either error counter at or above 96.
    pub fn error_warning(&self) -> bool {
        self.0 & 0x01 != 0
    }
}

/// Driver handle for one MCP2515 (8 MHz oscillator).
pub struct Mcp2515<SPI, D> {
    regs: RegisterInterface<SPI>,
    delay: D,
    mode: OperationMode,
    config: ControllerConfig,
    initialized: bool,
}

impl<SPI, D> Mcp2515<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Wrap an SPI device and a delay provider with the default timing.
    ///
    /// No transaction is issued; the chip is assumed to be in its power-on
    /// Configuration mode until [`reset`](Self::reset) or [`initialize`](Self::initialize).
    pub fn new(spi: SPI, delay: D) -> Self {
        Self::with_config(spi, delay, ControllerConfig::default())
    }

    /// Same as [`new`](Self::new) with explicit timing.
    pub fn with_config(spi: SPI, delay: D, config: ControllerConfig) -> Self {
        Self {
            regs: RegisterInterface::new(spi),
            delay,
            mode: OperationMode::Configuration,
            config,
            initialized: false,
        }
    }

    /// Full bring-up: reset, Configuration mode, bit timing, RX interrupts,
    /// accept-all receive buffers, Normal mode.
    ///
    /// A mode verification failure aborts the sequence and is returned as
    /// [`ControllerError::ModeTimeout`]; the caller decides whether start-up fails.
    pub fn initialize(
        &mut self,
        profile: BitRateProfile,
    ) -> Result<(), ControllerError<SPI::Error>> {
        self.initialized = false;

        self.reset()?;
        self.set_mode(OperationMode::Configuration)?;
        self.configure_bit_rate(profile)?;

        self.regs
            .write_byte(register::CANINTE, RX0IF | RX1IF)
            .map_err(ControllerError::Spi)?;
        // No filtering: every frame on the bus lands in RXB0, overflowing into RXB1.
        self.regs
            .write_byte(register::RXB0CTRL, RXM_ACCEPT_ALL | BUKT_ROLLOVER)
            .map_err(ControllerError::Spi)?;
        self.regs
            .write_byte(register::RXB1CTRL, RXM_ACCEPT_ALL)
            .map_err(ControllerError::Spi)?;

        self.set_mode(OperationMode::Normal)?;
        self.initialized = true;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "MCP2515 initialized at {} bit/s",
            profile.bits_per_second()
        );
        Ok(())
    }

    /// `true` once [`initialize`](Self::initialize) completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Timing in use.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Raw READ_STATUS byte (RX/TX flags).
    pub fn read_status(&mut self) -> Result<u8, ControllerError<SPI::Error>> {
        self.regs.read_status().map_err(ControllerError::Spi)
    }

    /// Raw RX_STATUS byte.
    pub fn rx_status(&mut self) -> Result<u8, ControllerError<SPI::Error>> {
        self.regs.rx_status().map_err(ControllerError::Spi)
    }

    /// Current EFLG error flags.
    pub fn error_flags(&mut self) -> Result<ErrorFlags, ControllerError<SPI::Error>> {
        self.regs
            .read_byte(register::EFLG)
            .map(ErrorFlags)
            .map_err(ControllerError::Spi)
    }

    /// Read any register.
    pub fn read_register(&mut self, address: u8) -> Result<u8, ControllerError<SPI::Error>> {
        self.regs.read_byte(address).map_err(ControllerError::Spi)
    }

    /// Release the SPI link and the delay provider.
    pub fn release(self) -> (SPI, D) {
        (self.regs.release(), self.delay)
    }
}
