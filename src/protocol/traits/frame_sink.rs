//! Minimal abstraction for something that accepts outgoing CAN frames.
//! Lets the telemetry layer run on the bare driver, a shared handle, or a test double.
use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use crate::error::ControllerError;
use crate::protocol::controller::transmit::TxOutcome;
use crate::protocol::controller::Mcp2515;
use crate::protocol::frame::CanFrame;

/// Contract to hand one frame to the transmit path without blocking on the bus.
pub trait FrameSink {
    type Error: core::fmt::Debug;
    /// Queue `frame`. [`TxOutcome::Busy`] means "try again later".
    fn send_frame(&mut self, frame: &CanFrame) -> Result<TxOutcome, Self::Error>;
}

impl<SPI, D> FrameSink for Mcp2515<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    type Error = ControllerError<SPI::Error>;

    fn send_frame(&mut self, frame: &CanFrame) -> Result<TxOutcome, Self::Error> {
        self.send(frame)
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    type Error = S::Error;

    fn send_frame(&mut self, frame: &CanFrame) -> Result<TxOutcome, Self::Error> {
        (**self).send_frame(frame)
    }
}
