//! Textual attribute surface
//!
//! Exposes each codec field as a named attribute with a sysfs-style textual
//! contract, grouped the same way the kernel driver lays out its directory:
//!
//! ```text
//! baud_rate/baud_rate    word_size/word_size    cs_select/cs_select
//! spi0/mode0  spi0/cs_auto0  spi0/cs_enable0    (and spi1..spi3)
//! tx_data/tx_fifo        rx_data/rx_fifo
//! ```
//!
//! Integers are shown in decimal. Stores accept decimal, `0x` hex and
//! leading-zero octal. The chip select attributes show `true`/`false` and
//! accept `auto`/`manual`. Shown values end with a newline; a single trailing
//! newline on stored values is ignored.
//!
//! [`AttributeTable`] also keeps the last value seen for each attribute. The
//! hardware stays authoritative; the mirror is only for display.

use core::fmt::Write;

use crate::access::RegisterAccess;
use crate::control::{Device, SpiController, SpiMode};
use crate::error::{Error, Result};
use crate::regs::NUM_DEVICES;

/// Capacity of a shown value
pub const SHOW_BUF_LEN: usize = 16;

/// Buffer holding a shown value
pub type ShowBuf = heapless::String<SHOW_BUF_LEN>;

/// Text shown by `rx_fifo` when the RX FIFO reads as empty
pub const RX_NO_DATA: &str = "-1";

/// Which codec field an attribute is bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    /// Baud rate divisor, verbatim
    BaudRate,
    /// Word size in bits
    WordSize,
    /// Active chip select
    ChipSelect,
    /// SPI mode of a device
    Mode(Device),
    /// Automatic chip select of a device
    CsAuto(Device),
    /// Chip select output enable of a device
    CsEnable(Device),
    /// TX FIFO (write only)
    TxFifo,
    /// RX FIFO (read only)
    RxFifo,
}

/// A named attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Directory the attribute lives in
    pub group: &'static str,
    /// File name of the attribute
    pub name: &'static str,
    /// Bound field
    pub kind: AttributeKind,
}

impl Attribute {
    const fn new(group: &'static str, name: &'static str, kind: AttributeKind) -> Self {
        Self { group, name, kind }
    }

    /// Whether the attribute can be shown
    pub const fn readable(&self) -> bool {
        !matches!(self.kind, AttributeKind::TxFifo)
    }

    /// Whether the attribute can be stored
    pub const fn writable(&self) -> bool {
        !matches!(self.kind, AttributeKind::RxFifo)
    }

    /// Permission bits the kernel driver registers the attribute with
    pub const fn permissions(&self) -> u16 {
        match self.kind {
            AttributeKind::RxFifo => 0o444,
            _ => 0o664,
        }
    }

    /// Whether `path` (`group/name` or bare name) names this attribute
    pub fn matches(&self, path: &str) -> bool {
        match path.split_once('/') {
            Some((group, name)) => group == self.group && name == self.name,
            None => path == self.name,
        }
    }
}

impl core::fmt::Display for Attribute {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

const D0: Device = Device::ALL[0];
const D1: Device = Device::ALL[1];
const D2: Device = Device::ALL[2];
const D3: Device = Device::ALL[3];

/// Every attribute, in registration order
pub const ATTRIBUTES: [Attribute; 17] = [
    Attribute::new("baud_rate", "baud_rate", AttributeKind::BaudRate),
    Attribute::new("word_size", "word_size", AttributeKind::WordSize),
    Attribute::new("cs_select", "cs_select", AttributeKind::ChipSelect),
    Attribute::new("spi0", "mode0", AttributeKind::Mode(D0)),
    Attribute::new("spi0", "cs_auto0", AttributeKind::CsAuto(D0)),
    Attribute::new("spi0", "cs_enable0", AttributeKind::CsEnable(D0)),
    Attribute::new("spi1", "mode1", AttributeKind::Mode(D1)),
    Attribute::new("spi1", "cs_auto1", AttributeKind::CsAuto(D1)),
    Attribute::new("spi1", "cs_enable1", AttributeKind::CsEnable(D1)),
    Attribute::new("spi2", "mode2", AttributeKind::Mode(D2)),
    Attribute::new("spi2", "cs_auto2", AttributeKind::CsAuto(D2)),
    Attribute::new("spi2", "cs_enable2", AttributeKind::CsEnable(D2)),
    Attribute::new("spi3", "mode3", AttributeKind::Mode(D3)),
    Attribute::new("spi3", "cs_auto3", AttributeKind::CsAuto(D3)),
    Attribute::new("spi3", "cs_enable3", AttributeKind::CsEnable(D3)),
    Attribute::new("tx_data", "tx_fifo", AttributeKind::TxFifo),
    Attribute::new("rx_data", "rx_fifo", AttributeKind::RxFifo),
];

/// Look up an attribute by `group/name` or bare name
pub fn find(path: &str) -> Option<&'static Attribute> {
    let path = path.trim_matches('/');
    ATTRIBUTES.iter().find(|attr| attr.matches(path))
}

/// Parse an unsigned integer the way the kernel's `kstrtouint(s, 0, ..)` does
pub fn parse_uint(input: &str) -> Result<u32> {
    let s = strip_newline(input);
    let s = s.strip_prefix('+').unwrap_or(s);

    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    // from_str_radix takes a sign of its own; only one is allowed, before the prefix
    if digits.is_empty() || digits.starts_with('+') {
        return Err(Error::InvalidValue);
    }
    u32::from_str_radix(digits, radix).map_err(|_| Error::InvalidValue)
}

fn strip_newline(input: &str) -> &str {
    input.strip_suffix('\n').unwrap_or(input)
}

/// Parse an `auto`/`manual` chip select value
fn parse_cs_mode(input: &str) -> Result<bool> {
    match strip_newline(input) {
        "auto" => Ok(true),
        "manual" => Ok(false),
        _ => Err(Error::InvalidValue),
    }
}

/// Last value seen for each attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mirror {
    /// Baud rate divisor
    pub baud_rate: u32,
    /// Word size
    pub word_size: u32,
    /// Active chip select
    pub cs_select: u32,
    /// Mode per device
    pub modes: [u32; NUM_DEVICES as usize],
    /// Automatic chip select per device
    pub cs_auto: [bool; NUM_DEVICES as usize],
    /// Chip select output per device
    pub cs_enable: [bool; NUM_DEVICES as usize],
    /// Last word pushed to the TX FIFO
    pub tx_fifo: u32,
    /// Last word popped from the RX FIFO (`None` when it read as empty)
    pub rx_fifo: Option<u32>,
}

impl Default for Mirror {
    fn default() -> Self {
        Self {
            baud_rate: 25_000_000,
            word_size: 32,
            cs_select: 0,
            modes: [0; NUM_DEVICES as usize],
            cs_auto: [false; NUM_DEVICES as usize],
            cs_enable: [false; NUM_DEVICES as usize],
            tx_fifo: 0,
            rx_fifo: Some(0),
        }
    }
}

/// Attribute surface over a controller
pub struct AttributeTable<R: RegisterAccess> {
    spi: SpiController<R>,
    mirror: Mirror,
}

impl<R: RegisterAccess> AttributeTable<R> {
    /// Create a table with the default mirror values
    pub fn new(spi: SpiController<R>) -> Self {
        Self {
            spi,
            mirror: Mirror::default(),
        }
    }

    /// Last values seen
    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    /// Get a mutable reference to the underlying controller
    pub fn controller_mut(&mut self) -> &mut SpiController<R> {
        &mut self.spi
    }

    /// Release the underlying controller
    pub fn into_inner(self) -> SpiController<R> {
        self.spi
    }

    /// Read an attribute from the hardware and format it
    pub fn show(&mut self, path: &str) -> Result<ShowBuf> {
        let attr = find(path).ok_or(Error::UnknownAttribute)?;

        let mut buf = ShowBuf::new();
        let m = &mut self.mirror;
        let res = match attr.kind {
            AttributeKind::BaudRate => {
                m.baud_rate = self.spi.baud_rate_divisor();
                writeln!(buf, "{}", m.baud_rate)
            }
            AttributeKind::WordSize => {
                m.word_size = u32::from(self.spi.word_size());
                writeln!(buf, "{}", m.word_size)
            }
            AttributeKind::ChipSelect => {
                m.cs_select = u32::from(self.spi.chip_select().index());
                writeln!(buf, "{}", m.cs_select)
            }
            AttributeKind::Mode(dev) => {
                let mode = self.spi.device_mode(dev).bits();
                m.modes[dev.index() as usize] = mode;
                writeln!(buf, "{}", mode)
            }
            AttributeKind::CsAuto(dev) => {
                let on = self.spi.is_auto_chip_select_enabled(dev);
                m.cs_auto[dev.index() as usize] = on;
                writeln!(buf, "{}", on)
            }
            AttributeKind::CsEnable(dev) => {
                let on = self.spi.is_chip_select_output_enabled(dev);
                m.cs_enable[dev.index() as usize] = on;
                writeln!(buf, "{}", on)
            }
            AttributeKind::RxFifo => {
                m.rx_fifo = self.spi.read_rx_data();
                match m.rx_fifo {
                    Some(value) => writeln!(buf, "{}", value),
                    None => writeln!(buf, "{}", RX_NO_DATA),
                }
            }
            AttributeKind::TxFifo => return Err(Error::PermissionDenied),
        };
        res.map_err(|_| Error::BufferTooSmall)?;

        Ok(buf)
    }

    /// Parse a value and write it to the hardware
    ///
    /// Nothing is written when the value does not parse or is out of range.
    pub fn store(&mut self, path: &str, input: &str) -> Result<()> {
        let attr = find(path).ok_or(Error::UnknownAttribute)?;
        log::debug!("store {} <- {:?}", attr, strip_newline(input));

        let m = &mut self.mirror;
        match attr.kind {
            AttributeKind::BaudRate => {
                let value = parse_uint(input)?;
                self.spi.set_baud_rate_divisor(value);
                m.baud_rate = value;
            }
            AttributeKind::WordSize => {
                let value = parse_uint(input)?;
                let size = u8::try_from(value).map_err(|_| Error::InvalidWordSize(value))?;
                self.spi.set_word_size(size)?;
                m.word_size = value;
            }
            AttributeKind::ChipSelect => {
                let dev = Device::try_from(parse_uint(input)?)?;
                self.spi.set_chip_select(dev);
                m.cs_select = u32::from(dev.index());
            }
            AttributeKind::Mode(dev) => {
                let mode = SpiMode::try_from(parse_uint(input)?)?;
                self.spi.set_device_mode(dev, mode);
                m.modes[dev.index() as usize] = mode.bits();
            }
            AttributeKind::CsAuto(dev) => {
                let on = parse_cs_mode(input)?;
                if on {
                    self.spi.enable_auto_chip_select(dev);
                } else {
                    self.spi.disable_auto_chip_select(dev);
                }
                m.cs_auto[dev.index() as usize] = on;
            }
            AttributeKind::CsEnable(dev) => {
                let on = parse_cs_mode(input)?;
                if on {
                    self.spi.enable_chip_select_output(dev);
                } else {
                    self.spi.disable_chip_select_output(dev);
                }
                m.cs_enable[dev.index() as usize] = on;
            }
            AttributeKind::TxFifo => {
                let value = parse_uint(input)?;
                self.spi.write_tx_data(value);
                m.tx_fifo = value;
            }
            AttributeKind::RxFifo => return Err(Error::PermissionDenied),
        }

        Ok(())
    }
}
