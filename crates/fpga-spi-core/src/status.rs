//! STATUS register decoding

use crate::regs::{STATUS_TX_EMPTY, STATUS_TX_FULL, STATUS_TX_OVERFLOW};
use bitflags::bitflags;

bitflags! {
    /// TX FIFO flags reported by the STATUS register
    ///
    /// Decoded fresh on every read; nothing is cached.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u32 {
        /// A word was written while the TX FIFO was full
        const TX_FIFO_OVERFLOW = STATUS_TX_OVERFLOW;
        /// The TX FIFO cannot accept another word
        const TX_FIFO_FULL     = STATUS_TX_FULL;
        /// The TX FIFO has drained
        const TX_FIFO_EMPTY    = STATUS_TX_EMPTY;
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        StatusFlags::empty()
    }
}

impl StatusFlags {
    /// Decode a raw STATUS value, ignoring bits without a defined meaning
    pub const fn from_raw(value: u32) -> Self {
        Self::from_bits_truncate(value)
    }

    /// TX FIFO overflow flag
    pub const fn tx_overflow(&self) -> bool {
        self.contains(Self::TX_FIFO_OVERFLOW)
    }

    /// TX FIFO full flag
    pub const fn tx_full(&self) -> bool {
        self.contains(Self::TX_FIFO_FULL)
    }

    /// TX FIFO empty flag
    pub const fn tx_empty(&self) -> bool {
        self.contains(Self::TX_FIFO_EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_flags_set() {
        let flags = StatusFlags::from_raw(0x38);
        assert!(flags.tx_overflow());
        assert!(flags.tx_full());
        assert!(flags.tx_empty());
    }

    #[test]
    fn test_no_flags_set() {
        let flags = StatusFlags::from_raw(0x00);
        assert!(!flags.tx_overflow());
        assert!(!flags.tx_full());
        assert!(!flags.tx_empty());
    }

    #[test]
    fn test_unrelated_bits_ignored() {
        let flags = StatusFlags::from_raw(0xFFFF_FFC7 | STATUS_TX_FULL);
        assert_eq!(flags, StatusFlags::TX_FIFO_FULL);
    }

    #[test]
    fn test_default_has_no_flags() {
        let flags = StatusFlags::default();
        assert_eq!(flags, StatusFlags::empty());
        assert!(!flags.tx_empty());
        assert!(StatusFlags::from_raw(STATUS_TX_EMPTY).tx_empty());
    }
}
