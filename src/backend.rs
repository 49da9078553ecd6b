//! Register backend registration and dispatch
//!
//! A backend string is the backend name, optionally followed by options:
//! `physmap:base=0xFF200000,offset=0`, `dummy:fifo=8`.

use fpga_spi_core::RegisterAccess;
use thiserror::Error;

/// Information about a backend
pub struct BackendInfo {
    /// Name used in the backend string
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
}

/// Errors opening a backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// No backend with this name was compiled in
    #[error("Unknown backend: {0}\nUse 'fpga-spi list-backends' for the available backends")]
    Unknown(String),

    /// The backend rejected its options or failed to start
    #[error("Failed to open {name} backend: {source}")]
    Open {
        /// Backend name
        name: &'static str,
        /// Underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Get information about all available backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "physmap")]
    backends.push(BackendInfo {
        name: "physmap",
        description: "SPI IP core through /dev/mem (base=<addr>,offset=<addr>,span=<bytes>) - requires root",
    });

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        description: "In-memory emulator with GPIO expander (fifo=<depth>,inputs=<byte>,stall=<polls>,press=<reads>)",
    });

    backends
}

/// Parse a backend string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_backend_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Open the backend named by `backend`
#[allow(unused_variables)]
pub fn open_backend(backend: &str) -> Result<Box<dyn RegisterAccess>, BackendError> {
    let (name, options) = parse_backend_string(backend);

    match name {
        #[cfg(feature = "physmap")]
        "physmap" => {
            let open = |e: fpga_spi_physmap::PhysMapError| BackendError::Open {
                name: "physmap",
                source: e.into(),
            };
            let config = fpga_spi_physmap::parse_options(&options).map_err(open)?;
            let regs = fpga_spi_physmap::MappedRegisters::open(&config).map_err(|e| {
                log::error!("Make sure you have root privileges and the FPGA is configured");
                open(e)
            })?;
            Ok(Box::new(regs))
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            log::info!("Using the in-memory SPI IP core emulator");
            let config =
                fpga_spi_dummy::parse_options(&options).map_err(|e| BackendError::Open {
                    name: "dummy",
                    source: e.into(),
                })?;
            Ok(Box::new(fpga_spi_dummy::DummySpi::new(config)))
        }

        _ => Err(BackendError::Unknown(name.to_string())),
    }
}
