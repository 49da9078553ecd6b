//! Register window of the SPI IP core in physical memory

use std::thread;
use std::time::Duration;

use fpga_spi_core::access::RegisterAccess;
use fpga_spi_core::regs::{Register, REGISTER_SPAN};

use crate::error::{PhysMapError, Result};
use crate::physmap::PhysMap;

/// Physical base of the light-weight HPS-to-FPGA bridge
pub const DEFAULT_BRIDGE_BASE: u64 = 0xFF20_0000;

/// Offset of the SPI IP core inside the bridge window
pub const DEFAULT_SPI_OFFSET: u64 = 0;

/// Where the register file lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Physical base of the bridge window
    pub base: u64,
    /// Offset of the IP core from `base`
    pub offset: u64,
    /// Bytes to map
    pub span: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_BRIDGE_BASE,
            offset: DEFAULT_SPI_OFFSET,
            span: REGISTER_SPAN,
        }
    }
}

impl MapConfig {
    /// Physical address of the DATA register
    pub fn address(&self) -> u64 {
        self.base.wrapping_add(self.offset)
    }

    /// Check that the window covers the register file at a word boundary
    pub fn validate(&self) -> Result<()> {
        if self.span < REGISTER_SPAN {
            return Err(PhysMapError::SpanTooSmall {
                span: self.span,
                required: REGISTER_SPAN,
            });
        }
        if self.base.checked_add(self.offset).is_none() {
            return Err(PhysMapError::InvalidParameter(format!(
                "base {:#x} + offset {:#x} overflows",
                self.base, self.offset
            )));
        }
        if self.address() & 3 != 0 {
            return Err(PhysMapError::InvalidParameter(format!(
                "register base {:#x} is not word aligned",
                self.address()
            )));
        }
        Ok(())
    }
}

/// Parse a number that may be decimal or hex
fn parse_number(key: &str, s: &str) -> Result<u64> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse::<u64>()
    };
    parsed.map_err(|e| PhysMapError::InvalidParameter(format!("{}={}: {}", key, s, e)))
}

/// Parse backend options into a [`MapConfig`]
///
/// Recognised keys are `base`, `offset` and `span`. Unknown keys are warned
/// about and ignored.
pub fn parse_options(options: &[(&str, &str)]) -> Result<MapConfig> {
    let mut config = MapConfig::default();

    for (key, value) in options {
        match *key {
            "base" => config.base = parse_number(key, value)?,
            "offset" => config.offset = parse_number(key, value)?,
            "span" => {
                config.span = usize::try_from(parse_number(key, value)?)
                    .map_err(|_| PhysMapError::InvalidParameter(format!("span={}", value)))?;
            }
            _ => {
                log::warn!("physmap: Unknown option: {}={}", key, value);
            }
        }
    }

    config.validate()?;
    Ok(config)
}

/// SPI IP core registers mapped through /dev/mem
pub struct MappedRegisters {
    map: PhysMap,
}

impl MappedRegisters {
    /// Access the registers through an existing mapping
    ///
    /// The mapping must start at the DATA register and cover the whole
    /// register file.
    pub fn new(map: PhysMap) -> Result<Self> {
        if map.span() < REGISTER_SPAN {
            return Err(PhysMapError::SpanTooSmall {
                span: map.span(),
                required: REGISTER_SPAN,
            });
        }
        Ok(Self { map })
    }

    /// Map the register file described by `config`
    pub fn open(config: &MapConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Mapping SPI IP core at {:#x} ({} bytes)",
            config.address(),
            config.span
        );
        let map = PhysMap::new(config.address(), config.span)?;
        Self::new(map)
    }

    /// Physical address of the register file
    pub fn phys_addr(&self) -> u64 {
        self.map.phys_addr()
    }
}

impl RegisterAccess for MappedRegisters {
    fn read(&mut self, reg: Register) -> u32 {
        self.map.read32(reg.offset())
    }

    fn write(&mut self, reg: Register, value: u32) {
        self.map.write32(reg.offset(), value)
    }

    fn delay_us(&mut self, us: u32) {
        thread::sleep(Duration::from_micros(u64::from(us)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config, MapConfig::default());
        assert_eq!(config.address(), 0xFF20_0000);
        assert_eq!(config.span, 16);
    }

    #[test]
    fn test_parse_options() {
        let config =
            parse_options(&[("base", "0xC0000000"), ("offset", "0x40"), ("span", "4096")]).unwrap();
        assert_eq!(config.base, 0xC000_0000);
        assert_eq!(config.offset, 0x40);
        assert_eq!(config.address(), 0xC000_0040);
        assert_eq!(config.span, 4096);
    }

    #[test]
    fn test_unknown_option_ignored() {
        assert!(parse_options(&[("irq", "80")]).is_ok());
    }

    #[test]
    fn test_invalid_options() {
        assert!(matches!(
            parse_options(&[("base", "bridge")]),
            Err(PhysMapError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("span", "8")]),
            Err(PhysMapError::SpanTooSmall { span: 8, required: 16 })
        ));
        assert!(matches!(
            parse_options(&[("offset", "0x2")]),
            Err(PhysMapError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(MapConfig::default().validate().is_ok());
        assert!(matches!(
            MapConfig {
                span: 4,
                ..MapConfig::default()
            }
            .validate(),
            Err(PhysMapError::SpanTooSmall { span: 4, required: 16 })
        ));
        assert!(matches!(
            MapConfig {
                base: u64::MAX,
                offset: 4,
                span: 16
            }
            .validate(),
            Err(PhysMapError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_open_rejects_short_window() {
        // Last word of a page: one page of mapping, one word of registers
        let config = MapConfig {
            base: 0xFF20_0FFC,
            offset: 0,
            span: 4,
        };
        assert!(matches!(
            MappedRegisters::open(&config).err(),
            Some(PhysMapError::SpanTooSmall { span: 4, required: 16 })
        ));
    }

    #[test]
    fn test_open_rejects_unaligned_base() {
        let config = MapConfig {
            base: 0xFF20_0000,
            offset: 0x2,
            span: 16,
        };
        assert!(matches!(
            MappedRegisters::open(&config).err(),
            Some(PhysMapError::InvalidParameter(_))
        ));
    }

    #[test]
    #[ignore] // Requires root, /dev/mem and a configured FPGA
    fn test_open_bridge() {
        let mut regs = MappedRegisters::open(&MapConfig::default()).unwrap();
        let _ = regs.read(Register::Status);
    }
}
