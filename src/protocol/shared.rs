//! Controller handle shared between several producers (e.g. one task
//! transmitting telemetry while another polls for received frames).
//!
//! The chip is not safe under interleaved register sequences: a TX burst
//! must never be split by another transaction. Locking therefore covers a
//! whole driver operation, not each SPI byte. Pick the raw mutex that
//! matches the execution model (`CriticalSectionRawMutex` across threads or
//! interrupts, `NoopRawMutex` inside a single executor).
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use embedded_hal::{delay::DelayNs, spi::SpiDevice};

use crate::error::ControllerError;
use crate::protocol::controller::transmit::TxOutcome;
use crate::protocol::controller::Mcp2515;
use crate::protocol::frame::CanFrame;
use crate::protocol::traits::frame_sink::FrameSink;

/// Mutex-guarded [`Mcp2515`].
pub struct SharedController<M: RawMutex, SPI, D> {
    inner: Mutex<M, RefCell<Mcp2515<SPI, D>>>,
}

impl<M, SPI, D> SharedController<M, SPI, D>
where
    M: RawMutex,
    SPI: SpiDevice,
    D: DelayNs,
{
    pub fn new(controller: Mcp2515<SPI, D>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(controller)),
        }
    }

    /// Run `f` with exclusive access for its whole duration.
    ///
    /// `f` must not call back into the same `SharedController`.
    pub fn with<R>(&self, f: impl FnOnce(&mut Mcp2515<SPI, D>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Exclusive [`Mcp2515::send`].
    pub fn send(&self, frame: &CanFrame) -> Result<TxOutcome, ControllerError<SPI::Error>> {
        self.with(|controller| controller.send(frame))
    }

    /// Exclusive [`Mcp2515::receive`].
    pub fn receive(&self) -> Result<Option<CanFrame>, ControllerError<SPI::Error>> {
        self.with(|controller| controller.receive())
    }

    /// Recover the controller once no other producer holds a reference.
    pub fn into_inner(self) -> Mcp2515<SPI, D> {
        self.inner.into_inner().into_inner()
    }
}

impl<M, SPI, D> FrameSink for &SharedController<M, SPI, D>
where
    M: RawMutex,
    SPI: SpiDevice,
    D: DelayNs,
{
    type Error = ControllerError<SPI::Error>;

    fn send_frame(&mut self, frame: &CanFrame) -> Result<TxOutcome, Self::Error> {
        self.send(frame)
    }
}
