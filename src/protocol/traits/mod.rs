//! Abstraction traits at the seams of the driver (frame output and time source).
pub mod clock;
pub mod frame_sink;
