//! CAN controller protocol layer: frame model, identifier register codec,
//! the MCP2515 driver itself, and the seams used by higher layers.
pub mod controller;
pub mod frame;
pub mod id_codec;
pub mod shared;
pub mod traits;
