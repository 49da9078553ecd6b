//! Register access layer
//!
//! [`RegisterAccess`] is the only thing the codec needs from a backend: word
//! reads and writes of the four named registers, plus a delay for polling.
//! Backends include the `/dev/mem` mapping in `fpga-spi-physmap`, the emulator
//! in `fpga-spi-dummy` and the plain [`MemRegisters`] below.
//!
//! Implementations perform no masking. Read-modify-write of a field is the
//! codec's job.

use crate::regs::Register;

/// Word access to the SPI IP core registers
///
/// Once a value implementing this trait exists the register window is
/// mapped, so reads and writes cannot fail. A backend whose mapping can fail
/// reports that from its constructor instead.
pub trait RegisterAccess {
    /// Read the 32-bit contents of a register
    ///
    /// Reading DATA pops the RX FIFO on real hardware.
    fn read(&mut self, reg: Register) -> u32;

    /// Write exactly `value` to a register
    ///
    /// Writing DATA pushes onto the TX FIFO on real hardware.
    fn write(&mut self, reg: Register, value: u32);

    /// Wait for the given number of microseconds between status polls
    fn delay_us(&mut self, us: u32);
}

impl<R: RegisterAccess + ?Sized> RegisterAccess for &mut R {
    fn read(&mut self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u32) {
        (**self).write(reg, value)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

#[cfg(feature = "std")]
impl<R: RegisterAccess + ?Sized> RegisterAccess for std::boxed::Box<R> {
    fn read(&mut self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u32) {
        (**self).write(reg, value)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// In-memory register file
///
/// Four plain words with no FIFO behaviour: DATA reads back what was last
/// written. Useful as a test double for the codec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemRegisters {
    words: [u32; 4],
    delayed_us: u64,
}

impl MemRegisters {
    /// Create a register file with every register cleared
    pub const fn new() -> Self {
        Self {
            words: [0; 4],
            delayed_us: 0,
        }
    }

    /// Create a register file with the given initial contents
    pub const fn with_words(words: [u32; 4]) -> Self {
        Self {
            words,
            delayed_us: 0,
        }
    }

    /// Current contents of a register
    pub fn get(&self, reg: Register) -> u32 {
        self.words[reg.word()]
    }

    /// Overwrite a register, as the hardware would
    pub fn set(&mut self, reg: Register, value: u32) {
        self.words[reg.word()] = value;
    }

    /// Total time requested through `delay_us`
    pub fn delayed_us(&self) -> u64 {
        self.delayed_us
    }
}

impl RegisterAccess for MemRegisters {
    fn read(&mut self, reg: Register) -> u32 {
        self.words[reg.word()]
    }

    fn write(&mut self, reg: Register, value: u32) {
        self.words[reg.word()] = value;
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += u64::from(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_registers_are_independent() {
        let mut regs = MemRegisters::new();
        regs.write(Register::Control, 0xDEAD_BEEF);
        regs.write(Register::Brd, 0x640);

        assert_eq!(regs.read(Register::Control), 0xDEAD_BEEF);
        assert_eq!(regs.read(Register::Brd), 0x640);
        assert_eq!(regs.read(Register::Data), 0);
        assert_eq!(regs.read(Register::Status), 0);
    }

    #[test]
    fn test_access_through_reference() {
        fn poke<R: RegisterAccess>(mut regs: R) {
            regs.write(Register::Data, 42);
            regs.delay_us(10);
        }

        let mut regs = MemRegisters::new();
        poke(&mut regs);
        assert_eq!(regs.get(Register::Data), 42);
        assert_eq!(regs.delayed_us(), 10);
    }
}
