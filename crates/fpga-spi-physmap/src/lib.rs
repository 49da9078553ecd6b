//! fpga-spi-physmap - /dev/mem access to the FPGA SPI IP core
//!
//! Maps the register file of the SPI IP core into the process and exposes it
//! through [`fpga_spi_core::RegisterAccess`]. Opening the mapping is the only
//! step that can fail; once a [`MappedRegisters`] exists every register access
//! goes straight to the hardware.
//!
//! # Backend options
//!
//! - `base=<addr>` - physical base of the bridge window (default `0xFF200000`)
//! - `offset=<addr>` - offset of the IP core inside the window (default `0`)
//! - `span=<bytes>` - bytes to map (default `16`)
//!
//! Mapping requires root privileges.

pub mod device;
pub mod error;
pub mod physmap;

pub use device::{parse_options, MapConfig, MappedRegisters};
pub use error::{PhysMapError, Result};
pub use physmap::PhysMap;
