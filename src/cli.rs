//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse an unsigned number the way `strtoul(s, NULL, 0)` does
///
/// `0x` prefix selects hex, a leading `0` octal, anything else decimal.
pub fn parse_number(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"));
    let (digits, radix, kind) = if let Some(hex) = hex {
        (hex, 16, "hex value")
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8, "octal value")
    } else {
        (s, 10, "number")
    };
    if digits.starts_with('+') {
        return Err(format!("Invalid {}: {}", kind, s));
    }
    u32::from_str_radix(digits, radix).map_err(|e| format!("Invalid {}: {}", kind, e))
}

/// Help text for the backend argument
fn backend_help() -> String {
    let mut names = Vec::new();
    if cfg!(feature = "physmap") {
        names.push("physmap");
    }
    if cfg!(feature = "dummy") {
        names.push("dummy");
    }
    format!(
        "Register backend, name[:key=value,...] [available: {}]",
        names.join(", ")
    )
}

#[derive(Parser)]
#[command(name = "fpga-spi")]
#[command(author, version, about = "Inspect and drive the FPGA SPI IP core", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short, long, global = true, default_value = "physmap", help = backend_help())]
    pub backend: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Register names accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RegisterArg {
    /// DATA register (TX/RX FIFO)
    Data,
    /// STATUS register
    Status,
    /// CONTROL register
    Control,
    /// Baud rate divisor
    #[value(name = "BRD", alias = "brd")]
    Brd,
}

/// Targets of the write command
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WriteTarget {
    /// DATA register (TX FIFO)
    Data,
    /// STATUS register
    Status,
    /// CONTROL register
    Control,
    /// Baud rate divisor (whole divisor, shifted into place)
    #[value(name = "BRD", alias = "brd")]
    Brd,
    /// Set the global enable bit
    Enable,
    /// Clear the global enable bit
    Disable,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a register
    #[command(name = "Read", alias = "read")]
    Read {
        /// Register to read
        register: RegisterArg,
    },

    /// Write a register, or enable/disable the core
    #[command(name = "Write", alias = "write")]
    Write {
        /// Register to write, or enable/disable
        target: WriteTarget,

        /// Value (decimal, 0x hex or 0 octal); required for registers
        #[arg(value_parser = parse_number)]
        value: Option<u32>,
    },

    /// Decode the CONTROL register into its fields
    Decode {
        /// Decode this value instead of reading the hardware
        #[arg(value_parser = parse_number)]
        value: Option<u32>,
    },

    /// Attribute (sysfs-style) access
    #[command(subcommand)]
    Attr(AttrCommands),

    /// Apply a TOML controller profile
    Configure {
        /// Profile file
        #[arg(short, long)]
        profile: PathBuf,
    },

    /// Red/green LED demo on the GPIO expander
    ///
    /// Turns the red LED on, waits for the pushbutton, then switches to green.
    StopGo {
        /// Give up waiting for each transfer or the button after this long
        #[arg(long)]
        timeout_ms: Option<u32>,

        /// Delay between status and button polls
        #[arg(long, default_value_t = fpga_spi_core::poll::DEFAULT_POLL_INTERVAL_US)]
        interval_us: u32,
    },

    /// List available backends
    ListBackends,
}

#[derive(Subcommand)]
pub enum AttrCommands {
    /// List attributes with their permissions
    List,

    /// Show an attribute
    Show {
        /// Attribute path (group/name or name)
        path: String,
    },

    /// Store a value into an attribute
    Store {
        /// Attribute path (group/name or name)
        path: String,

        /// Value as it would be written to the attribute file
        value: String,
    },
}
