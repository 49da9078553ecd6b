//! Error types for fpga-spi-core
//!
//! This module provides a no_std compatible error type. Register access itself
//! cannot fail once a mapping exists, so every variant here is either a value
//! that was rejected before it reached the hardware or a bounded wait that ran
//! out of time.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Range errors
    /// Device index outside 0..=3
    InvalidDevice(u32),
    /// Word size outside 1..=32
    InvalidWordSize(u32),
    /// SPI mode outside 0..=3
    InvalidMode(u32),
    /// Expander pin outside 0..=7
    InvalidPin(u32),

    // Polling errors
    /// A status poll did not see the expected flag in time
    Timeout,

    // Attribute errors
    /// No attribute with the given path
    UnknownAttribute,
    /// Attribute does not support the requested direction (show or store)
    PermissionDenied,
    /// Attribute input could not be parsed
    InvalidValue,
    /// Show output did not fit the attribute buffer
    BufferTooSmall,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDevice(d) => write!(f, "invalid device index {} (expected 0-3)", d),
            Self::InvalidWordSize(s) => write!(f, "invalid word size {} (expected 1-32)", s),
            Self::InvalidMode(m) => write!(f, "invalid SPI mode {} (expected 0-3)", m),
            Self::InvalidPin(p) => write!(f, "invalid expander pin {} (expected 0-7)", p),
            Self::Timeout => write!(f, "timed out waiting for status"),
            Self::UnknownAttribute => write!(f, "unknown attribute"),
            Self::PermissionDenied => write!(f, "attribute access not permitted"),
            Self::InvalidValue => write!(f, "invalid attribute value"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
