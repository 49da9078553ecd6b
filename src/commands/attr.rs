//! Attribute (sysfs-style) commands

use std::error::Error;

use fpga_spi_core::attr::{AttributeTable, ATTRIBUTES};
use fpga_spi_core::RegisterAccess;

/// List attributes with their permissions
pub fn cmd_list() {
    for attr in &ATTRIBUTES {
        println!("{:04o}  {}", attr.permissions(), attr);
    }
}

/// Show one attribute
pub fn cmd_show<R: RegisterAccess>(
    table: &mut AttributeTable<R>,
    path: &str,
) -> Result<(), Box<dyn Error>> {
    let text = table
        .show(path)
        .map_err(|e| format!("{}: {}", path, e))?;
    print!("{}", text);
    Ok(())
}

/// Store a value into one attribute
pub fn cmd_store<R: RegisterAccess>(
    table: &mut AttributeTable<R>,
    path: &str,
    value: &str,
) -> Result<(), Box<dyn Error>> {
    table
        .store(path, value)
        .map_err(|e| format!("{}: {}", path, e))?;
    log::info!("{} <- {}", path, value);
    Ok(())
}
