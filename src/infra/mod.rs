//! Hardware-facing layer: MCP2515 register map and SPI register transactions.
pub mod registers;
pub mod spi;
