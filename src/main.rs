//! fpga-spi - Inspect and drive the FPGA SPI IP core
//!
//! The SPI IP core exposes four registers (DATA, STATUS, CONTROL, BRD) behind
//! the light-weight HPS-to-FPGA bridge. This tool reads and writes them,
//! decodes CONTROL, offers the same attribute interface as the kernel driver,
//! applies TOML profiles and runs the stop/go GPIO expander demo.
//!
//! # Backends
//!
//! - **physmap** - maps the registers through /dev/mem (needs root)
//! - **dummy** - in-memory emulator of the core and the GPIO expander
//!
//! Every command goes through the same `SpiController`, so anything that works
//! against the emulator works against the hardware.

mod backend;
mod cli;
mod commands;

use clap::error::ErrorKind;
use clap::Parser;
use cli::{AttrCommands, Cli, Commands};
use fpga_spi_core::attr::AttributeTable;
use fpga_spi_core::{Register, RegisterAccess, SpiController};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                // Unrecognised input is not a failure
                println!("  command not understood");
                return Ok(());
            }
        },
    };

    // Initialize logger; -v/-vv override the global level of RUST_LOG
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = verbosity_level(cli.verbose) {
        logger.filter_level(level);
    }
    logger.init();

    // Commands that never touch the hardware
    match cli.command {
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
        Commands::Decode { value: Some(value) } => {
            commands::decode::cmd_decode(value);
            Ok(())
        }
        Commands::Attr(AttrCommands::List) => {
            commands::attr::cmd_list();
            Ok(())
        }
        command => {
            let regs = backend::open_backend(&cli.backend)?;
            run(SpiController::new(regs), command)
        }
    }
}

/// Log level selected by the -v count, if any
fn verbosity_level(verbose: u8) -> Option<log::LevelFilter> {
    match verbose {
        0 => None, // RUST_LOG or info
        1 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

fn run(
    mut spi: SpiController<Box<dyn RegisterAccess>>,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Read { register } => commands::registers::cmd_read(&mut spi, register),
        Commands::Write { target, value } => {
            if !commands::registers::cmd_write(&mut spi, target, value) {
                println!("  command not understood");
            }
        }
        Commands::Decode { value } => {
            let control = value.unwrap_or_else(|| spi.read_register(Register::Control));
            commands::decode::cmd_decode(control);
        }
        Commands::Attr(subcmd) => {
            let mut table = AttributeTable::new(spi);
            match subcmd {
                AttrCommands::List => commands::attr::cmd_list(),
                AttrCommands::Show { path } => commands::attr::cmd_show(&mut table, &path)?,
                AttrCommands::Store { path, value } => {
                    commands::attr::cmd_store(&mut table, &path, &value)?
                }
            }
        }
        Commands::Configure { profile } => commands::configure::cmd_configure(&mut spi, &profile)?,
        Commands::StopGo {
            timeout_ms,
            interval_us,
        } => {
            let policy = commands::stop_go::poll_policy(timeout_ms, interval_us);
            commands::stop_go::cmd_stop_go(spi, policy)?;
        }
        Commands::ListBackends => commands::list_backends(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_level() {
        assert_eq!(verbosity_level(0), None);
        assert_eq!(verbosity_level(1), Some(log::LevelFilter::Debug));
        assert_eq!(verbosity_level(2), Some(log::LevelFilter::Trace));
        assert_eq!(verbosity_level(5), Some(log::LevelFilter::Trace));
    }

    #[test]
    fn test_verbose_flag_reaches_logger_level() {
        let cli =
            Cli::try_parse_from(["fpga-spi", "-vv", "-b", "dummy", "Write", "enable"]).unwrap();
        assert_eq!(verbosity_level(cli.verbose), Some(log::LevelFilter::Trace));

        let cli = Cli::try_parse_from(["fpga-spi", "Read", "status", "-v"]).unwrap();
        assert_eq!(verbosity_level(cli.verbose), Some(log::LevelFilter::Debug));
    }
}
