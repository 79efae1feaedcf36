//! `canspi-telemetry` library: register-level driver for the MCP2515
//! SPI-attached CAN controller, and the telemetry layer perception loops use
//! to publish lane, sign, and traffic-light status on the vehicle bus.
//! The crate exposes the infrastructure modules (register map, SPI register
//! transactions), the protocol logic (controller modes, bit timing, frame
//! codec, transmit and receive paths), and the telemetry publisher.
#![cfg_attr(not(test), no_std)]
//==================================================================================
/// Driver, SPI, and perception-loop errors.
pub mod error;
/// MCP2515 register map and raw SPI register access.
pub mod infra;
/// CAN frame model, identifier codec, and the controller driver.
pub mod protocol;
/// Status codes, CAN payloads, publication policy, and perception loop.
pub mod telemetry;
//==================================================================================
