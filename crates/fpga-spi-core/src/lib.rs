//! fpga-spi-core - Register map and CONTROL field codec for the FPGA SPI IP core
//!
//! The IP core sits behind the light-weight HPS-to-FPGA bridge and exposes four
//! 32-bit registers: DATA, STATUS, CONTROL and BRD (baud rate divisor). This
//! crate knows how those registers are laid out and how to change one field of
//! CONTROL without disturbing the others. It does not know how the registers
//! are mapped; that is supplied through the [`access::RegisterAccess`] trait.
//!
//! # Features
//!
//! - `std` - Enable standard library support and TOML controller profiles
//!
//! # Example
//!
//! ```
//! use fpga_spi_core::access::MemRegisters;
//! use fpga_spi_core::control::{Device, SpiController, SpiMode};
//!
//! let mut spi = SpiController::new(MemRegisters::new());
//! spi.set_word_size(8)?;
//! spi.set_device_mode(Device::new(1)?, SpiMode::Mode2);
//! assert_eq!(spi.word_size(), 8);
//! assert_eq!(spi.device_mode(Device::new(1)?), SpiMode::Mode2);
//! # Ok::<(), fpga_spi_core::Error>(())
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod access;
pub mod attr;
pub mod control;
pub mod error;
pub mod gpio;
pub mod poll;
#[cfg(feature = "std")]
pub mod profile;
pub mod regs;
pub mod status;

pub use access::{MemRegisters, RegisterAccess};
pub use control::{ControlFields, Device, SpiController, SpiMode};
pub use error::{Error, Result};
pub use regs::Register;
pub use status::StatusFlags;
