//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (SPI transport, mode
//! verification, frame construction, perception pipeline).
use crate::protocol::controller::mode::OperationMode;
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while building a [`CanFrame`](crate::protocol::frame::CanFrame).
pub enum FrameError {
    /// Identifier does not fit in 11 bits (standard) or 29 bits (extended).
    #[error("Identifier {id:#X} out of range (extended: {extended})")]
    IdentifierOutOfRange { id: u32, extended: bool },
    /// Classic CAN carries at most eight payload bytes.
    #[error("Payload too long: {len} bytes (max 8)")]
    DataTooLong { len: usize },
}

#[derive(Error, Debug)]
/// Errors reported by the MCP2515 controller driver.
pub enum ControllerError<E: core::fmt::Debug> {
    /// The SPI transaction itself failed. Not recoverable inside the driver.
    #[error("SPI transfer error: {0:?}")]
    Spi(E),

    /// CANSTAT never reported the requested mode within the polling budget.
    #[error("Mode {requested:?} not confirmed after {attempts} polls")]
    ModeTimeout {
        requested: OperationMode,
        attempts: u8,
    },

    /// Frame rejected before reaching the chip.
    #[error(transparent)]
    InvalidFrame(#[from] FrameError),
}

#[derive(Error, Debug)]
/// Failures of one perception-loop step.
pub enum PerceptionError<S: core::fmt::Debug, K: core::fmt::Debug> {
    /// Pulling the next video frame failed.
    #[error("Frame source error: {0:?}")]
    Source(S),
    /// Emitting the telemetry frame failed at the transport level.
    #[error("Frame sink error: {0:?}")]
    Sink(K),
}
