//! GPIO expander on chip select 0
//!
//! The demo board hangs an 8-bit serial GPIO expander off the SPI core. Each
//! word written to DATA is one expander frame:
//!
//! ```text
//!  23        16 15       8 7         0
//! +------------+----------+-----------+
//! | opcode|R/W | register |   value   |
//! +------------+----------+-----------+
//! ```
//!
//! The expander only accepts whole-register writes, so [`GpioExpander`] keeps
//! shadow copies of the direction, pull-up and output latch registers and
//! changes one pin at a time on top of them.

use crate::access::RegisterAccess;
use crate::control::SpiController;
use crate::error::{Error, Result};
use crate::poll::{Deadline, PollPolicy};
use crate::regs::Register;
use crate::status::StatusFlags;

/// Expander device opcode (hardware address 0)
pub const OPCODE: u8 = 0x40;
/// R/W bit of the opcode byte, set for reads
pub const OPCODE_READ: u8 = 0x01;

/// Direction register, 1 = input
pub const IODIR: u8 = 0x00;
/// Pull-up register, 1 = pull-up enabled
pub const GPPU: u8 = 0x06;
/// Port register (reads pins, writes output latch)
pub const GPIO: u8 = 0x09;

/// Number of expander pins
pub const NUM_PINS: u8 = 8;

/// Direction register value after reset (all inputs)
const IODIR_RESET: u8 = 0xFF;

/// Expander pin (0-7)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pin(u8);

impl Pin {
    /// Validate a pin number
    pub const fn new(pin: u8) -> Result<Self> {
        if pin < NUM_PINS {
            Ok(Self(pin))
        } else {
            Err(Error::InvalidPin(pin as u32))
        }
    }

    /// Pin number
    pub const fn number(&self) -> u8 {
        self.0
    }

    const fn mask(&self) -> u8 {
        1 << self.0
    }
}

/// Frame writing `value` to expander register `reg`
pub const fn write_frame(reg: u8, value: u8) -> u32 {
    ((OPCODE as u32) << 16) | ((reg as u32) << 8) | value as u32
}

/// Frame reading expander register `reg`
pub const fn read_frame(reg: u8) -> u32 {
    (((OPCODE | OPCODE_READ) as u32) << 16) | ((reg as u32) << 8)
}

/// Pin-level access to the GPIO expander
pub struct GpioExpander<R: RegisterAccess> {
    spi: SpiController<R>,
    iodir: u8,
    gppu: u8,
    olat: u8,
    poll: PollPolicy,
}

impl<R: RegisterAccess> GpioExpander<R> {
    /// Wrap a controller, assuming the expander is in its reset state
    pub fn new(spi: SpiController<R>) -> Self {
        Self {
            spi,
            iodir: IODIR_RESET,
            gppu: 0,
            olat: 0,
            poll: PollPolicy::blocking(),
        }
    }

    /// Set how reads wait for the transfer to finish
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Get a mutable reference to the underlying controller
    pub fn controller_mut(&mut self) -> &mut SpiController<R> {
        &mut self.spi
    }

    /// Release the underlying controller
    pub fn into_inner(self) -> SpiController<R> {
        self.spi
    }

    fn send(&mut self, reg: u8, value: u8) {
        log::debug!("expander reg {:#04x} <- {:#04x}", reg, value);
        self.spi.write_tx_data(write_frame(reg, value));
    }

    fn update(shadow: &mut u8, pin: Pin, set: bool) -> u8 {
        if set {
            *shadow |= pin.mask();
        } else {
            *shadow &= !pin.mask();
        }
        *shadow
    }

    /// Make a pin an input
    pub fn select_pin_direction_input(&mut self, pin: Pin) {
        let value = Self::update(&mut self.iodir, pin, true);
        self.send(IODIR, value);
    }

    /// Make a pin an output
    pub fn select_pin_direction_output(&mut self, pin: Pin) {
        let value = Self::update(&mut self.iodir, pin, false);
        self.send(IODIR, value);
    }

    /// Enable the pull-up on a pin
    pub fn select_pin_pull_output(&mut self, pin: Pin) {
        let value = Self::update(&mut self.gppu, pin, true);
        self.send(GPPU, value);
    }

    /// Disable the pull-up on a pin
    pub fn select_pin_push_output(&mut self, pin: Pin) {
        let value = Self::update(&mut self.gppu, pin, false);
        self.send(GPPU, value);
    }

    /// Drive an output pin
    pub fn set_pin_value(&mut self, pin: Pin, high: bool) {
        let value = Self::update(&mut self.olat, pin, high);
        self.send(GPIO, value);
    }

    /// Read the level of a pin
    ///
    /// Sends a port read and waits for the TX FIFO to drain before taking the
    /// reply from DATA. A zero reply is a valid port value here, so the RX
    /// "no data" convention does not apply.
    pub fn pin_value(&mut self, pin: Pin) -> Result<bool> {
        self.spi.write_tx_data(read_frame(GPIO));
        self.spi.wait_for_status(StatusFlags::TX_FIFO_EMPTY, &self.poll)?;
        let port = self.spi.read_register(Register::Data);
        log::trace!("expander port = {:#04x}", port & 0xFF);
        Ok(port & u32::from(pin.mask()) != 0)
    }

    /// Block until a pin reads `level`, sampling every `policy.interval_us`
    pub fn wait_for_level(&mut self, pin: Pin, level: bool, policy: &PollPolicy) -> Result<()> {
        let mut deadline = Deadline::new(policy);

        loop {
            if self.pin_value(pin)? == level {
                return Ok(());
            }

            if deadline.expired() {
                return Err(Error::Timeout);
            }

            self.spi.inner_mut().delay_us(policy.interval_us);
            deadline.consume(policy.interval_us);
        }
    }
}
