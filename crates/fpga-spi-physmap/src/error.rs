//! Error types for register mapping

use std::path::PathBuf;

use thiserror::Error;

/// Errors establishing the register mapping
#[derive(Debug, Error)]
pub enum PhysMapError {
    /// Failed to open the memory device
    #[error("Failed to open '{path}': {source}")]
    Open {
        /// Device path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// mmap of the register window failed
    #[error("Failed to map {size} bytes at {address:#x}: {source}")]
    Map {
        /// Physical address requested
        address: u64,
        /// Size requested
        size: usize,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Window too small for the register file
    #[error("Span of {span} bytes does not cover the {required} byte register file")]
    SpanTooSmall {
        /// Requested span
        span: usize,
        /// Bytes needed
        required: usize,
    },

    /// Invalid backend option
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Mapping not available on this platform
    #[error("Not supported: {0}")]
    NotSupported(&'static str),
}

/// Result type for register mapping
pub type Result<T> = std::result::Result<T, PhysMapError>;
