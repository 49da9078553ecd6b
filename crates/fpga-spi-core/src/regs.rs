//! SPI IP core register definitions
//!
//! Register offsets and bit definitions for the FPGA SPI IP core. The core
//! occupies a 16-byte window made of four 32-bit words.
//!
//! # CONTROL layout
//!
//! | Bits  | Field           |
//! |-------|-----------------|
//! | 0-4   | word size - 1   |
//! | 5-8   | CS auto, one bit per device |
//! | 9-12  | CS enable, one bit per device |
//! | 13-14 | CS select       |
//! | 15    | global enable   |
//! | 16-23 | SPI mode, two bits per device |

// ============================================================================
// Register File
// ============================================================================

/// Size of the register window in bytes
pub const REGISTER_SPAN: usize = 16;

/// Word offset of the DATA register
pub const OFS_DATA: usize = 0;
/// Word offset of the STATUS register
pub const OFS_STATUS: usize = 1;
/// Word offset of the CONTROL register
pub const OFS_CONTROL: usize = 2;
/// Word offset of the BRD (baud rate divisor) register
pub const OFS_BRD: usize = 3;

/// A register of the SPI IP core
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    /// TX FIFO on write, RX FIFO on read
    Data,
    /// TX FIFO flags
    Status,
    /// Word size, chip select and mode configuration
    Control,
    /// Baud rate divisor
    Brd,
}

impl Register {
    /// All registers in address order
    pub const ALL: [Register; 4] = [Self::Data, Self::Status, Self::Control, Self::Brd];

    /// Word index of the register within the window
    pub const fn word(&self) -> usize {
        match self {
            Self::Data => OFS_DATA,
            Self::Status => OFS_STATUS,
            Self::Control => OFS_CONTROL,
            Self::Brd => OFS_BRD,
        }
    }

    /// Byte offset of the register within the window
    pub const fn offset(&self) -> usize {
        self.word() * 4
    }

    /// Name used by the command line tool
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Status => "status",
            Self::Control => "control",
            Self::Brd => "BRD",
        }
    }

    /// Look up a register by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|reg| reg.name().eq_ignore_ascii_case(name))
    }
}

impl core::fmt::Display for Register {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.name())
    }
}

// ============================================================================
// CONTROL bits
// ============================================================================

/// Word size field (stored as size - 1)
pub const WORD_SIZE_MASK: u32 = 0x1F;

/// CS auto bit for device 0; device d uses bit CS_AUTO_BIT_OFS + d
pub const CS_AUTO_BIT_OFS: u32 = 5;

/// CS enable bit for device 0; device d uses bit CS_ENABLE_BIT_OFS + d
pub const CS_ENABLE_BIT_OFS: u32 = 9;

/// Chip select field
pub const CS_SELECT_BIT_OFS: u32 = 13;
/// Chip select field width
pub const CS_SELECT_MASK: u32 = 0x3;

/// Global enable
pub const ENABLE_BIT_OFS: u32 = 15;
/// Global enable bit
pub const ENABLE: u32 = 1 << ENABLE_BIT_OFS;

/// SPI mode for device 0; device d uses bits DEVICE_MODE_BIT_OFS + 2d
pub const DEVICE_MODE_BIT_OFS: u32 = 16;
/// SPI mode field width
pub const DEVICE_MODE_MASK: u32 = 0x3;

/// Number of chip select lines
pub const NUM_DEVICES: u8 = 4;

// ============================================================================
// STATUS bits
// ============================================================================

/// TX FIFO overflow (sticky, write 1 to clear)
pub const STATUS_TX_OVERFLOW_OFS: u32 = 3;
/// TX FIFO overflow bit
pub const STATUS_TX_OVERFLOW: u32 = 1 << STATUS_TX_OVERFLOW_OFS;
/// TX FIFO full
pub const STATUS_TX_FULL_OFS: u32 = 4;
/// TX FIFO full bit
pub const STATUS_TX_FULL: u32 = 1 << STATUS_TX_FULL_OFS;
/// TX FIFO empty
pub const STATUS_TX_EMPTY_OFS: u32 = 5;
/// TX FIFO empty bit
pub const STATUS_TX_EMPTY: u32 = 1 << STATUS_TX_EMPTY_OFS;

// ============================================================================
// BRD
// ============================================================================

/// Fractional bits of the divisor when written through the whole-number path
pub const BRD_FRACTION_BITS: u32 = 6;

/// Mask covering the bits of a field `mask` placed at `ofs`
#[inline]
pub const fn field_mask(mask: u32, ofs: u32) -> u32 {
    mask << ofs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_offsets() {
        assert_eq!(Register::Data.offset(), 0);
        assert_eq!(Register::Status.offset(), 4);
        assert_eq!(Register::Control.offset(), 8);
        assert_eq!(Register::Brd.offset(), 12);
        assert!(Register::ALL.iter().all(|r| r.offset() + 4 <= REGISTER_SPAN));
    }

    #[test]
    fn test_register_names() {
        assert_eq!(Register::from_name("BRD"), Some(Register::Brd));
        assert_eq!(Register::from_name("brd"), Some(Register::Brd));
        assert_eq!(Register::from_name("Data"), Some(Register::Data));
        assert_eq!(Register::from_name("fifo"), None);
    }

    #[test]
    fn test_control_fields_do_not_overlap() {
        let mut fields = [
            field_mask(WORD_SIZE_MASK, 0),
            field_mask(0xF, CS_AUTO_BIT_OFS),
            field_mask(0xF, CS_ENABLE_BIT_OFS),
            field_mask(CS_SELECT_MASK, CS_SELECT_BIT_OFS),
            ENABLE,
            0,
        ];
        for d in 0..NUM_DEVICES as u32 {
            fields[5] |= field_mask(DEVICE_MODE_MASK, DEVICE_MODE_BIT_OFS + 2 * d);
        }

        let mut seen = 0u32;
        for mask in fields {
            assert_eq!(seen & mask, 0, "field {:#010x} overlaps {:#010x}", mask, seen);
            seen |= mask;
        }
        assert_eq!(seen, 0x00FF_FFFF);
    }
}
