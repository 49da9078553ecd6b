//! Raw register read and write commands

use std::fmt::Write as _;

use fpga_spi_core::{Register, RegisterAccess, SpiController, StatusFlags};

use crate::cli::{RegisterArg, WriteTarget};

impl From<RegisterArg> for Register {
    fn from(arg: RegisterArg) -> Self {
        match arg {
            RegisterArg::Data => Register::Data,
            RegisterArg::Status => Register::Status,
            RegisterArg::Control => Register::Control,
            RegisterArg::Brd => Register::Brd,
        }
    }
}

fn yes_no(set: bool) -> &'static str {
    if set {
        "Yes"
    } else {
        "No"
    }
}

/// Format a register value the way `read` prints it
pub fn format_register(register: RegisterArg, value: u32) -> String {
    let label = match register {
        RegisterArg::Data => "Data",
        RegisterArg::Status => "Status",
        RegisterArg::Control => "Control",
        RegisterArg::Brd => "BRD",
    };
    let mut out = format!("{} register -- 0x{:08X}\n", label, value);

    if register == RegisterArg::Status {
        let flags = StatusFlags::from_raw(value);
        let _ = writeln!(out, "TX FIFO OVERFLOW:\t{}", yes_no(flags.tx_overflow()));
        let _ = writeln!(out, "TX FIFO FULL:\t{}", yes_no(flags.tx_full()));
        let _ = writeln!(out, "TX FIFO EMPTY:\t{}", yes_no(flags.tx_empty()));
    }

    out
}

/// Read a register and print it
pub fn cmd_read<R: RegisterAccess>(spi: &mut SpiController<R>, register: RegisterArg) {
    let value = spi.read_register(register.into());
    print!("{}", format_register(register, value));
}

/// Carry out a write
///
/// Returns `false` when the target and value do not go together: register
/// targets need a value, `enable` and `disable` take none.
pub fn cmd_write<R: RegisterAccess>(
    spi: &mut SpiController<R>,
    target: WriteTarget,
    value: Option<u32>,
) -> bool {
    match (target, value) {
        (WriteTarget::Data, Some(v)) => spi.write_tx_data(v),
        (WriteTarget::Status, Some(v)) => spi.write_register(Register::Status, v),
        (WriteTarget::Control, Some(v)) => spi.write_register(Register::Control, v),
        (WriteTarget::Brd, Some(v)) => spi.set_baud_rate_divisor_whole(v),
        (WriteTarget::Enable, None) => spi.enable(),
        (WriteTarget::Disable, None) => spi.disable(),
        _ => return false,
    }
    true
}
