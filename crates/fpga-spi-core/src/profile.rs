//! TOML controller profiles
//!
//! A profile describes the CONTROL and BRD settings to apply in one go:
//!
//! ```toml
//! enable = true
//! baud_rate_divisor = "0x640"
//! word_size = 8
//! chip_select = 1
//!
//! [[device]]
//! index = 1
//! mode = 3
//! cs_auto = true
//! cs_enable = true
//! ```
//!
//! Every key is optional; absent keys leave the hardware as it is. The whole
//! profile is validated before the first register is written.

use std::fs;
use std::path::{Path, PathBuf};
use std::string::String;
use std::vec::Vec;
use std::format;

use serde::Deserialize;

use crate::access::RegisterAccess;
use crate::control::{Device, SpiController, SpiMode};
use crate::error::Error;

/// Errors loading or applying a profile
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Profile file could not be read
    #[error("failed to read profile '{path}': {source}")]
    Io {
        /// Path of the profile
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Profile is not valid TOML or has unknown keys
    #[error("failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    /// Profile names an out-of-range value
    #[error("invalid profile: {0}")]
    Invalid(#[from] Error),
}

/// Settings for one chip select line
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceProfile {
    /// Device index (0-3)
    pub index: u8,
    /// SPI mode (0-3)
    pub mode: Option<u8>,
    /// Automatic chip select
    pub cs_auto: Option<bool>,
    /// Chip select output enable
    pub cs_enable: Option<bool>,
}

/// Controller settings loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Global enable, applied after every other field
    pub enable: Option<bool>,
    /// BRD value, written verbatim
    #[serde(default, deserialize_with = "deserialize_opt_hex_u32")]
    pub baud_rate_divisor: Option<u32>,
    /// Bits per transfer (1-32)
    pub word_size: Option<u8>,
    /// Active chip select (0-3)
    pub chip_select: Option<u8>,
    /// Per-device settings
    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceProfile>,
}

/// Deserialize a u32 that can be hex (0x...) or decimal
fn deserialize_opt_hex_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrInt {
        Int(u32),
        Str(String),
    }

    match HexOrInt::deserialize(deserializer)? {
        HexOrInt::Int(n) => Ok(Some(n)),
        HexOrInt::Str(s) => parse_number(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parse a number that can be hex (0x...) or decimal
fn parse_number(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

impl Profile {
    /// Parse a profile from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self, ProfileError> {
        let profile: Profile = toml::from_str(s)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check every value without touching the hardware
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(size) = self.word_size {
            if !(1..=32).contains(&size) {
                return Err(Error::InvalidWordSize(u32::from(size)));
            }
        }
        if let Some(cs) = self.chip_select {
            Device::new(cs)?;
        }
        for dev in &self.devices {
            Device::new(dev.index)?;
            if let Some(mode) = dev.mode {
                SpiMode::try_from(mode)?;
            }
        }
        Ok(())
    }

    /// Apply the profile to a controller
    ///
    /// A profile that disables the peripheral does so before any other
    /// field is written; one that enables it does so last.
    pub fn apply<R: RegisterAccess>(&self, spi: &mut SpiController<R>) -> Result<(), Error> {
        self.validate()?;

        if self.enable == Some(false) {
            spi.disable();
        }
        if let Some(brd) = self.baud_rate_divisor {
            spi.set_baud_rate_divisor(brd);
        }
        if let Some(size) = self.word_size {
            spi.set_word_size(size)?;
        }
        if let Some(cs) = self.chip_select {
            spi.set_chip_select(Device::new(cs)?);
        }
        for profile in &self.devices {
            let dev = Device::new(profile.index)?;
            if let Some(mode) = profile.mode {
                spi.set_device_mode(dev, SpiMode::try_from(mode)?);
            }
            match profile.cs_auto {
                Some(true) => spi.enable_auto_chip_select(dev),
                Some(false) => spi.disable_auto_chip_select(dev),
                None => {}
            }
            match profile.cs_enable {
                Some(true) => spi.enable_chip_select_output(dev),
                Some(false) => spi.disable_chip_select_output(dev),
                None => {}
            }
        }
        if self.enable == Some(true) {
            spi.enable();
        }

        log::info!("Applied profile ({} device entries)", self.devices.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MemRegisters;
    use crate::regs::Register;

    const PROFILE: &str = r#"
enable = true
baud_rate_divisor = "0x640"
word_size = 8
chip_select = 1

[[device]]
index = 1
mode = 3
cs_auto = true
cs_enable = true

[[device]]
index = 3
mode = 2
"#;

    #[test]
    fn test_parse_profile() {
        let profile = Profile::from_toml_str(PROFILE).unwrap();
        assert_eq!(profile.enable, Some(true));
        assert_eq!(profile.baud_rate_divisor, Some(0x640));
        assert_eq!(profile.word_size, Some(8));
        assert_eq!(profile.chip_select, Some(1));
        assert_eq!(profile.devices.len(), 2);
        assert_eq!(profile.devices[1].mode, Some(2));
        assert_eq!(profile.devices[1].cs_auto, None);
    }

    #[test]
    fn test_apply_profile() {
        let profile = Profile::from_toml_str(PROFILE).unwrap();
        let mut spi = SpiController::new(MemRegisters::new());
        profile.apply(&mut spi).unwrap();

        let fields = spi.control_fields();
        assert!(fields.enabled);
        assert_eq!(fields.word_size, 8);
        assert_eq!(fields.chip_select, Device::new(1).unwrap());
        assert_eq!(fields.modes, [SpiMode::Mode0, SpiMode::Mode3, SpiMode::Mode0, SpiMode::Mode2]);
        assert_eq!(fields.cs_auto, [false, true, false, false]);
        assert_eq!(fields.cs_enable, [false, true, false, false]);
        assert_eq!(spi.baud_rate_divisor(), 0x640);
    }

    #[test]
    fn test_empty_profile_changes_nothing() {
        let profile = Profile::from_toml_str("").unwrap();
        let mut regs = MemRegisters::new();
        regs.set(Register::Control, 0x1234_5678);
        let mut spi = SpiController::new(regs);
        profile.apply(&mut spi).unwrap();
        assert_eq!(spi.inner().get(Register::Control), 0x1234_5678);
    }

    #[test]
    fn test_invalid_profiles_rejected() {
        assert!(matches!(
            Profile::from_toml_str("word_size = 0"),
            Err(ProfileError::Invalid(Error::InvalidWordSize(0)))
        ));
        assert!(matches!(
            Profile::from_toml_str("[[device]]\nindex = 4"),
            Err(ProfileError::Invalid(Error::InvalidDevice(4)))
        ));
        assert!(matches!(
            Profile::from_toml_str("[[device]]\nindex = 0\nmode = 5"),
            Err(ProfileError::Invalid(Error::InvalidMode(5)))
        ));
        assert!(matches!(
            Profile::from_toml_str("irq = 80"),
            Err(ProfileError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_profile_writes_nothing() {
        let profile = Profile {
            enable: Some(true),
            word_size: Some(40),
            ..Default::default()
        };
        let mut spi = SpiController::new(MemRegisters::new());
        assert_eq!(profile.apply(&mut spi), Err(Error::InvalidWordSize(40)));
        assert_eq!(spi.inner().get(Register::Control), 0);
    }
}
