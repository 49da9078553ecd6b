//! Apply a TOML controller profile

use std::error::Error;
use std::path::Path;

use fpga_spi_core::profile::Profile;
use fpga_spi_core::{RegisterAccess, SpiController};

/// Load `path` and apply it to the controller
pub fn cmd_configure<R: RegisterAccess>(
    spi: &mut SpiController<R>,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let profile = Profile::from_file(path)?;
    log::info!("Applying profile {}", path.display());
    profile.apply(spi)?;
    print!("{}", spi.control_fields());
    Ok(())
}
