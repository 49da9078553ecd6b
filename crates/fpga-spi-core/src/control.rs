//! CONTROL register field codec
//!
//! [`SpiController`] changes one field of the CONTROL register at a time.
//! Every setter reads CONTROL, clears the bits of its own field, ORs in the
//! new value and writes the word back, so bits belonging to other fields are
//! preserved. Nothing is cached between calls: each getter decodes the value
//! the hardware reports at that moment.
//!
//! Device indices and field values are validated before they are shifted into
//! place. An out-of-range value is rejected with an [`Error`] and CONTROL is
//! left untouched.
//!
//! The controller takes `&mut self` for every access. Sharing it between
//! threads needs an outer lock around each call, otherwise two concurrent
//! read-modify-write sequences can lose an update.

use core::fmt;

use crate::access::RegisterAccess;
use crate::error::{Error, Result};
use crate::poll::{Deadline, PollPolicy};
use crate::regs::*;
use crate::status::StatusFlags;

/// Chip select line / attached device (0-3)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Device(u8);

impl Device {
    /// All devices in index order
    pub const ALL: [Device; NUM_DEVICES as usize] = [Device(0), Device(1), Device(2), Device(3)];

    /// Validate a device index
    pub const fn new(index: u8) -> Result<Self> {
        if index < NUM_DEVICES {
            Ok(Self(index))
        } else {
            Err(Error::InvalidDevice(index as u32))
        }
    }

    /// Device index
    pub const fn index(&self) -> u8 {
        self.0
    }

    /// Bit of this device in a one-bit-per-device field starting at `base`
    const fn bit(&self, base: u32) -> u32 {
        1 << (base + self.0 as u32)
    }

    /// Offset of this device's mode field
    const fn mode_ofs(&self) -> u32 {
        DEVICE_MODE_BIT_OFS + 2 * self.0 as u32
    }
}

impl TryFrom<u32> for Device {
    type Error = Error;

    fn try_from(index: u32) -> Result<Self> {
        match u8::try_from(index) {
            Ok(index) => Self::new(index),
            Err(_) => Err(Error::InvalidDevice(index)),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// SPI clock polarity / phase combination
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0 = 0,
    /// CPOL=0, CPHA=1
    Mode1 = 1,
    /// CPOL=1, CPHA=0
    Mode2 = 2,
    /// CPOL=1, CPHA=1
    Mode3 = 3,
}

impl SpiMode {
    /// Decode the two-bit mode field
    const fn from_bits(bits: u32) -> Self {
        match bits & DEVICE_MODE_MASK {
            0 => Self::Mode0,
            1 => Self::Mode1,
            2 => Self::Mode2,
            _ => Self::Mode3,
        }
    }

    /// Two-bit encoding of the mode
    pub const fn bits(&self) -> u32 {
        *self as u32
    }

    /// Clock idles high
    pub const fn cpol(&self) -> bool {
        self.bits() & 0b10 != 0
    }

    /// Data is sampled on the trailing clock edge
    pub const fn cpha(&self) -> bool {
        self.bits() & 0b01 != 0
    }
}

impl TryFrom<u32> for SpiMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        if value <= DEVICE_MODE_MASK {
            Ok(Self::from_bits(value))
        } else {
            Err(Error::InvalidMode(value))
        }
    }
}

impl TryFrom<u8> for SpiMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::try_from(u32::from(value))
    }
}

impl fmt::Display for SpiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.bits(), f)
    }
}

/// Every field of a CONTROL value, decoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlFields {
    /// Bits per transfer (1-32)
    pub word_size: u8,
    /// Automatic chip select per device
    pub cs_auto: [bool; NUM_DEVICES as usize],
    /// Chip select output enable per device
    pub cs_enable: [bool; NUM_DEVICES as usize],
    /// Active chip select
    pub chip_select: Device,
    /// Global peripheral enable
    pub enabled: bool,
    /// SPI mode per device
    pub modes: [SpiMode; NUM_DEVICES as usize],
}

impl ControlFields {
    /// Decode a raw CONTROL value
    pub fn decode(value: u32) -> Self {
        let mut fields = Self {
            word_size: ((value & WORD_SIZE_MASK) + 1) as u8,
            cs_auto: [false; NUM_DEVICES as usize],
            cs_enable: [false; NUM_DEVICES as usize],
            chip_select: Device(((value >> CS_SELECT_BIT_OFS) & CS_SELECT_MASK) as u8),
            enabled: value & ENABLE != 0,
            modes: [SpiMode::Mode0; NUM_DEVICES as usize],
        };

        for dev in Device::ALL {
            let i = dev.index() as usize;
            fields.cs_auto[i] = value & dev.bit(CS_AUTO_BIT_OFS) != 0;
            fields.cs_enable[i] = value & dev.bit(CS_ENABLE_BIT_OFS) != 0;
            fields.modes[i] = SpiMode::from_bits(value >> dev.mode_ofs());
        }

        fields
    }
}

impl fmt::Display for ControlFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Enabled:      {}", if self.enabled { "Yes" } else { "No" })?;
        writeln!(f, "Word size:    {} bits", self.word_size)?;
        writeln!(f, "Chip select:  {}", self.chip_select)?;
        writeln!(f, "Device  Mode  CS auto  CS enable")?;
        for dev in Device::ALL {
            let i = dev.index() as usize;
            writeln!(
                f,
                "{:<6}  {:<4}  {:<7}  {}",
                dev,
                self.modes[i],
                if self.cs_auto[i] { "auto" } else { "manual" },
                if self.cs_enable[i] { "on" } else { "off" }
            )?;
        }
        Ok(())
    }
}

/// Field-level access to the SPI IP core
pub struct SpiController<R: RegisterAccess> {
    regs: R,
}

impl<R: RegisterAccess> SpiController<R> {
    /// Wrap a register backend
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Get a reference to the register backend
    pub fn inner(&self) -> &R {
        &self.regs
    }

    /// Get a mutable reference to the register backend
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Release the register backend
    pub fn into_inner(self) -> R {
        self.regs
    }

    // ========================================================================
    // Raw register access
    // ========================================================================

    /// Read a register without interpretation
    pub fn read_register(&mut self, reg: Register) -> u32 {
        let value = self.regs.read(reg);
        log::trace!("read  {:<7} = {:#010x}", reg, value);
        value
    }

    /// Write a register without masking
    pub fn write_register(&mut self, reg: Register, value: u32) {
        log::trace!("write {:<7} = {:#010x}", reg, value);
        self.regs.write(reg, value);
    }

    /// Replace the bits selected by `mask` in CONTROL with those of `bits`
    fn modify_control(&mut self, mask: u32, bits: u32) {
        let value = self.read_register(Register::Control);
        self.write_register(Register::Control, (value & !mask) | (bits & mask));
    }

    fn control_bit(&mut self, bit: u32) -> bool {
        self.read_register(Register::Control) & bit != 0
    }

    fn set_control_bit(&mut self, bit: u32, on: bool) {
        self.modify_control(bit, if on { bit } else { 0 });
    }

    // ========================================================================
    // Baud rate divisor
    // ========================================================================

    /// Write the BRD register verbatim
    ///
    /// The value is not checked against the divisor width; an oversized value
    /// gives undefined clocking, not a software error.
    pub fn set_baud_rate_divisor(&mut self, value: u32) {
        log::debug!("BRD <- {:#x}", value);
        self.write_register(Register::Brd, value);
    }

    /// Read the BRD register verbatim
    pub fn baud_rate_divisor(&mut self) -> u32 {
        self.read_register(Register::Brd)
    }

    /// Write a whole-number divisor, shifted past the fractional bits
    pub fn set_baud_rate_divisor_whole(&mut self, divisor: u32) {
        self.set_baud_rate_divisor(divisor << BRD_FRACTION_BITS);
    }

    /// Whole-number part of the divisor
    pub fn baud_rate_divisor_whole(&mut self) -> u32 {
        self.baud_rate_divisor() >> BRD_FRACTION_BITS
    }

    // ========================================================================
    // CONTROL fields
    // ========================================================================

    /// Set the number of bits per transfer (1-32)
    pub fn set_word_size(&mut self, size: u8) -> Result<()> {
        if !(1..=32).contains(&size) {
            return Err(Error::InvalidWordSize(u32::from(size)));
        }
        log::debug!("word size <- {}", size);
        self.modify_control(WORD_SIZE_MASK, u32::from(size - 1));
        Ok(())
    }

    /// Number of bits per transfer (1-32)
    pub fn word_size(&mut self) -> u8 {
        ((self.read_register(Register::Control) & WORD_SIZE_MASK) + 1) as u8
    }

    /// Route transfers to the given chip select
    pub fn set_chip_select(&mut self, device: Device) {
        log::debug!("chip select <- {}", device);
        self.modify_control(
            field_mask(CS_SELECT_MASK, CS_SELECT_BIT_OFS),
            u32::from(device.index()) << CS_SELECT_BIT_OFS,
        );
    }

    /// Active chip select
    pub fn chip_select(&mut self) -> Device {
        let value = self.read_register(Register::Control);
        Device(((value >> CS_SELECT_BIT_OFS) & CS_SELECT_MASK) as u8)
    }

    /// Set the SPI mode used for a device
    pub fn set_device_mode(&mut self, device: Device, mode: SpiMode) {
        log::debug!("device {} mode <- {}", device, mode);
        let ofs = device.mode_ofs();
        self.modify_control(field_mask(DEVICE_MODE_MASK, ofs), mode.bits() << ofs);
    }

    /// SPI mode used for a device
    pub fn device_mode(&mut self, device: Device) -> SpiMode {
        SpiMode::from_bits(self.read_register(Register::Control) >> device.mode_ofs())
    }

    /// Let the hardware drive the device's chip select per transfer
    pub fn enable_auto_chip_select(&mut self, device: Device) {
        log::debug!("device {} chip select <- auto", device);
        self.set_control_bit(device.bit(CS_AUTO_BIT_OFS), true);
    }

    /// Require software to drive the device's chip select
    pub fn disable_auto_chip_select(&mut self, device: Device) {
        log::debug!("device {} chip select <- manual", device);
        self.set_control_bit(device.bit(CS_AUTO_BIT_OFS), false);
    }

    /// Whether the device's chip select is driven automatically
    pub fn is_auto_chip_select_enabled(&mut self, device: Device) -> bool {
        self.control_bit(device.bit(CS_AUTO_BIT_OFS))
    }

    /// Enable the device's chip select output
    pub fn enable_chip_select_output(&mut self, device: Device) {
        log::debug!("device {} chip select output <- on", device);
        self.set_control_bit(device.bit(CS_ENABLE_BIT_OFS), true);
    }

    /// Disable the device's chip select output
    pub fn disable_chip_select_output(&mut self, device: Device) {
        log::debug!("device {} chip select output <- off", device);
        self.set_control_bit(device.bit(CS_ENABLE_BIT_OFS), false);
    }

    /// Whether the device's chip select output is enabled
    pub fn is_chip_select_output_enabled(&mut self, device: Device) -> bool {
        self.control_bit(device.bit(CS_ENABLE_BIT_OFS))
    }

    /// Set the global enable bit
    pub fn enable(&mut self) {
        log::debug!("peripheral <- enabled");
        self.set_control_bit(ENABLE, true);
    }

    /// Clear the global enable bit
    pub fn disable(&mut self) {
        log::debug!("peripheral <- disabled");
        self.set_control_bit(ENABLE, false);
    }

    /// Whether the peripheral is enabled
    pub fn is_enabled(&mut self) -> bool {
        self.control_bit(ENABLE)
    }

    /// Decode every CONTROL field from a single read
    pub fn control_fields(&mut self) -> ControlFields {
        ControlFields::decode(self.read_register(Register::Control))
    }

    // ========================================================================
    // Data and status
    // ========================================================================

    /// Push a word onto the TX FIFO
    pub fn write_tx_data(&mut self, value: u32) {
        self.write_register(Register::Data, value);
    }

    /// Pop a word from the RX FIFO
    ///
    /// The hardware returns 0 when there is nothing to read, so a received
    /// zero cannot be told apart from an empty FIFO. Both are reported as
    /// `None`.
    pub fn read_rx_data(&mut self) -> Option<u32> {
        match self.read_register(Register::Data) {
            0 => None,
            value => Some(value),
        }
    }

    /// Decode the TX FIFO flags
    pub fn read_status_flags(&mut self) -> StatusFlags {
        StatusFlags::from_raw(self.read_register(Register::Status))
    }

    /// Poll STATUS until all of `flags` are set
    pub fn wait_for_status(&mut self, flags: StatusFlags, policy: &PollPolicy) -> Result<StatusFlags> {
        let mut deadline = Deadline::new(policy);

        loop {
            let status = self.read_status_flags();
            if status.contains(flags) {
                return Ok(status);
            }

            if deadline.expired() {
                log::debug!("timed out waiting for {:?} (last {:?})", flags, status);
                return Err(Error::Timeout);
            }

            self.regs.delay_us(policy.interval_us);
            deadline.consume(policy.interval_us);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MemRegisters;

    const PATTERNS: [u32; 3] = [0x0000_0000, 0xFFFF_FFFF, 0xA5A5_5A5A];

    fn controller(control: u32) -> SpiController<MemRegisters> {
        let mut regs = MemRegisters::new();
        regs.set(Register::Control, control);
        SpiController::new(regs)
    }

    fn control(spi: &SpiController<MemRegisters>) -> u32 {
        spi.inner().get(Register::Control)
    }

    #[test]
    fn test_word_size_encoding() {
        let mut spi = controller(0);
        spi.set_word_size(8).unwrap();
        assert_eq!(control(&spi) & WORD_SIZE_MASK, 7);
        assert_eq!(spi.word_size(), 8);
    }

    #[test]
    fn test_word_size_round_trip_preserves_other_bits() {
        for pattern in PATTERNS {
            for size in 1..=32u8 {
                let mut spi = controller(pattern);
                spi.set_word_size(size).unwrap();
                assert_eq!(spi.word_size(), size);
                assert_eq!(control(&spi) & !WORD_SIZE_MASK, pattern & !WORD_SIZE_MASK);
            }
        }
    }

    #[test]
    fn test_word_size_out_of_range_rejected() {
        let mut spi = controller(0x1234_5678);
        assert_eq!(spi.set_word_size(0), Err(Error::InvalidWordSize(0)));
        assert_eq!(spi.set_word_size(33), Err(Error::InvalidWordSize(33)));
        assert_eq!(control(&spi), 0x1234_5678);
    }

    #[test]
    fn test_chip_select_round_trip_preserves_other_bits() {
        let mask = field_mask(CS_SELECT_MASK, CS_SELECT_BIT_OFS);
        for pattern in PATTERNS {
            for dev in Device::ALL {
                let mut spi = controller(pattern);
                spi.set_chip_select(dev);
                assert_eq!(spi.chip_select(), dev);
                assert_eq!(control(&spi) & !mask, pattern & !mask);
            }
        }
    }

    #[test]
    fn test_device_mode_round_trip_preserves_other_bits() {
        let modes = [SpiMode::Mode0, SpiMode::Mode1, SpiMode::Mode2, SpiMode::Mode3];
        for pattern in PATTERNS {
            for dev in Device::ALL {
                let mask = field_mask(DEVICE_MODE_MASK, DEVICE_MODE_BIT_OFS + 2 * dev.index() as u32);
                for mode in modes {
                    let mut spi = controller(pattern);
                    spi.set_device_mode(dev, mode);
                    assert_eq!(spi.device_mode(dev), mode);
                    assert_eq!(control(&spi) & !mask, pattern & !mask);
                }
            }
        }
    }

    #[test]
    fn test_device_mode_leaves_cs_enable_and_word_size() {
        // cs enable for all devices, word size 16
        let initial = (0xF << CS_ENABLE_BIT_OFS) | 15;
        let mut spi = controller(initial);
        spi.set_device_mode(Device::new(1).unwrap(), SpiMode::Mode2);

        let value = control(&spi);
        assert_eq!((value >> 18) & 0x3, 2);
        assert_eq!((value >> CS_ENABLE_BIT_OFS) & 0xF, 0xF);
        assert_eq!(value & WORD_SIZE_MASK, 15);
        assert_eq!(value, initial | (2 << 18));
    }

    #[test]
    fn test_auto_chip_select_per_device() {
        for pattern in PATTERNS {
            for dev in Device::ALL {
                let mut spi = controller(pattern);
                let bit = 1 << (CS_AUTO_BIT_OFS + dev.index() as u32);

                spi.enable_auto_chip_select(dev);
                assert!(spi.is_auto_chip_select_enabled(dev));
                assert_eq!(control(&spi), pattern | bit);

                spi.disable_auto_chip_select(dev);
                assert!(!spi.is_auto_chip_select_enabled(dev));
                assert_eq!(control(&spi), pattern & !bit);
            }
        }
    }

    #[test]
    fn test_auto_chip_select_does_not_touch_neighbours() {
        let mut spi = controller(0);
        let dev1 = Device::new(1).unwrap();
        spi.enable_auto_chip_select(dev1);

        assert!(!spi.is_auto_chip_select_enabled(Device::new(0).unwrap()));
        assert!(spi.is_auto_chip_select_enabled(dev1));
        assert!(!spi.is_auto_chip_select_enabled(Device::new(2).unwrap()));
    }

    #[test]
    fn test_disable_auto_chip_select_idempotent() {
        for dev in Device::ALL {
            let mut once = controller(0xFFFF_FFFF);
            once.disable_auto_chip_select(dev);

            let mut twice = controller(0xFFFF_FFFF);
            twice.disable_auto_chip_select(dev);
            twice.disable_auto_chip_select(dev);

            assert_eq!(control(&once), control(&twice));
        }
    }

    #[test]
    fn test_chip_select_output_per_device() {
        for pattern in PATTERNS {
            for dev in Device::ALL {
                let mut spi = controller(pattern);
                let bit = 1 << (CS_ENABLE_BIT_OFS + dev.index() as u32);

                spi.enable_chip_select_output(dev);
                assert!(spi.is_chip_select_output_enabled(dev));
                assert_eq!(control(&spi), pattern | bit);

                spi.disable_chip_select_output(dev);
                assert!(!spi.is_chip_select_output_enabled(dev));
                assert_eq!(control(&spi), pattern & !bit);
            }
        }
    }

    #[test]
    fn test_global_enable() {
        let mut spi = controller(0x00FF_0000);
        spi.enable();
        assert!(spi.is_enabled());
        assert_eq!(control(&spi), 0x00FF_8000);

        spi.disable();
        assert!(!spi.is_enabled());
        assert_eq!(control(&spi), 0x00FF_0000);
    }

    #[test]
    fn test_invalid_device_and_mode() {
        assert_eq!(Device::new(4), Err(Error::InvalidDevice(4)));
        assert_eq!(Device::try_from(0x1_0000u32), Err(Error::InvalidDevice(0x1_0000)));
        assert_eq!(SpiMode::try_from(4u8), Err(Error::InvalidMode(4)));
        assert_eq!(SpiMode::try_from(3u32), Ok(SpiMode::Mode3));
    }

    #[test]
    fn test_baud_rate_divisor() {
        let mut spi = controller(0xFFFF_FFFF);
        spi.set_baud_rate_divisor(25_000_000);
        assert_eq!(spi.baud_rate_divisor(), 25_000_000);
        assert_eq!(control(&spi), 0xFFFF_FFFF);

        spi.set_baud_rate_divisor_whole(25);
        assert_eq!(spi.inner().get(Register::Brd), 25 << 6);
        assert_eq!(spi.baud_rate_divisor_whole(), 25);
    }

    #[test]
    fn test_rx_data_sentinel() {
        let mut spi = controller(0);
        assert_eq!(spi.read_rx_data(), None);

        spi.inner_mut().set(Register::Data, 42);
        assert_eq!(spi.read_rx_data(), Some(42));
    }

    #[test]
    fn test_tx_data_written_verbatim() {
        let mut spi = controller(0);
        spi.write_tx_data(0xCAFE_F00D);
        assert_eq!(spi.inner().get(Register::Data), 0xCAFE_F00D);
    }

    #[test]
    fn test_read_status_flags() {
        let mut spi = controller(0);
        spi.inner_mut().set(Register::Status, 0x38);
        let flags = spi.read_status_flags();
        assert!(flags.tx_overflow() && flags.tx_full() && flags.tx_empty());

        spi.inner_mut().set(Register::Status, 0);
        assert_eq!(spi.read_status_flags(), StatusFlags::empty());
    }

    #[test]
    fn test_wait_for_status_times_out() {
        let mut spi = controller(0);
        let policy = PollPolicy::with_timeout_us(100).interval_us(10);
        assert_eq!(
            spi.wait_for_status(StatusFlags::TX_FIFO_EMPTY, &policy),
            Err(Error::Timeout)
        );
        assert_eq!(spi.inner().delayed_us(), 100);
    }

    #[test]
    fn test_wait_for_status_ready() {
        let mut spi = controller(0);
        spi.inner_mut().set(Register::Status, STATUS_TX_EMPTY);
        let status = spi
            .wait_for_status(StatusFlags::TX_FIFO_EMPTY, &PollPolicy::blocking())
            .unwrap();
        assert!(status.tx_empty());
        assert_eq!(spi.inner().delayed_us(), 0);
    }

    #[test]
    fn test_control_fields_decode() {
        let mut spi = controller(0);
        let dev2 = Device::new(2).unwrap();
        spi.set_word_size(12).unwrap();
        spi.set_chip_select(dev2);
        spi.set_device_mode(dev2, SpiMode::Mode3);
        spi.enable_auto_chip_select(dev2);
        spi.enable_chip_select_output(Device::new(0).unwrap());
        spi.enable();

        let fields = spi.control_fields();
        assert_eq!(fields.word_size, 12);
        assert_eq!(fields.chip_select, dev2);
        assert_eq!(fields.modes, [SpiMode::Mode0, SpiMode::Mode0, SpiMode::Mode3, SpiMode::Mode0]);
        assert_eq!(fields.cs_auto, [false, false, true, false]);
        assert_eq!(fields.cs_enable, [true, false, false, false]);
        assert!(fields.enabled);
    }

    #[test]
    fn test_spi_mode_polarity_phase() {
        assert!(!SpiMode::Mode0.cpol() && !SpiMode::Mode0.cpha());
        assert!(!SpiMode::Mode1.cpol() && SpiMode::Mode1.cpha());
        assert!(SpiMode::Mode2.cpol() && !SpiMode::Mode2.cpha());
        assert!(SpiMode::Mode3.cpol() && SpiMode::Mode3.cpha());
    }
}
