//! CONTROL register decoder

use fpga_spi_core::ControlFields;

/// Print every field of a CONTROL value
pub fn cmd_decode(control: u32) {
    println!("Control register -- 0x{:08X}", control);
    print!("{}", ControlFields::decode(control));
}
