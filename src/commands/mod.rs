//! CLI command implementations
//!
//! Every command works on a [`SpiController`](fpga_spi_core::SpiController)
//! over whichever backend was opened, so the same code drives the mapped
//! hardware and the emulator.

pub mod attr;
pub mod configure;
pub mod decode;
mod list;
pub mod registers;
pub mod stop_go;

pub use list::list_backends;
