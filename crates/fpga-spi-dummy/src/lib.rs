//! fpga-spi-dummy - In-memory emulator of the FPGA SPI IP core
//!
//! This crate provides a register-level model of the SPI IP core with the
//! serial GPIO expander of the demo board attached to chip select 0. It's
//! useful for testing and for running the CLI without an FPGA.
//!
//! The model covers what the driver stack can observe:
//!
//! - Words written to DATA queue up in a TX FIFO of configurable depth. A
//!   write to a full FIFO is dropped and latches the sticky overflow flag,
//!   which is cleared by writing 1 to STATUS bit 3.
//! - While CONTROL.ENABLE is set, each STATUS read shifts out one queued frame
//!   (after an optional stall) and latches the expander's reply for DATA.
//! - Reading DATA pops the reply; with nothing received it reads 0.
//! - CONTROL and BRD are plain storage.

use std::collections::VecDeque;

use fpga_spi_core::access::RegisterAccess;
use fpga_spi_core::gpio::{GPIO, GPPU, IODIR, OPCODE, OPCODE_READ};
use fpga_spi_core::regs::{Register, ENABLE, STATUS_TX_EMPTY, STATUS_TX_FULL, STATUS_TX_OVERFLOW};
use thiserror::Error;

/// Number of shifted-out frames kept for inspection
pub const SENT_HISTORY: usize = 64;

/// Expander input pin wired to the board pushbutton (active low)
pub const BUTTON_PIN: u8 = 2;

/// Errors parsing emulator options
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DummyError {
    /// Invalid option value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Configuration for the emulated core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyConfig {
    /// TX FIFO depth in words
    pub fifo_depth: usize,
    /// Levels driven onto the expander pins from outside
    pub inputs: u8,
    /// STATUS polls each frame stays queued before it is shifted out
    pub stall_polls: u32,
    /// Port reads after which the pushbutton reads pressed
    pub press_after: Option<u32>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            fifo_depth: 16,
            inputs: 0xFF, // pull-ups, button released
            stall_polls: 0,
            press_after: None,
        }
    }
}

/// Parse a number that may be decimal or hex
fn parse_number(key: &str, s: &str) -> Result<u32, DummyError> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|e| DummyError::InvalidParameter(format!("{}={}: {}", key, s, e)))
}

/// Parse backend options into a [`DummyConfig`]
///
/// Recognised keys: `fifo` (depth), `inputs` (pin levels), `stall` (polls per
/// frame) and `press` (port reads before the pushbutton goes low).
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig, DummyError> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "fifo" => {
                let depth = parse_number(key, value)?;
                if depth == 0 {
                    return Err(DummyError::InvalidParameter(
                        "fifo depth must be at least 1".to_string(),
                    ));
                }
                config.fifo_depth = depth as usize;
            }
            "inputs" => {
                config.inputs = u8::try_from(parse_number(key, value)?)
                    .map_err(|_| DummyError::InvalidParameter(format!("inputs={}", value)))?;
            }
            "stall" => config.stall_polls = parse_number(key, value)?,
            "press" => config.press_after = Some(parse_number(key, value)?),
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

/// Register state of the emulated GPIO expander
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderState {
    /// Direction register (1 = input)
    pub iodir: u8,
    /// Pull-up register
    pub gppu: u8,
    /// Output latch
    pub olat: u8,
}

impl Default for ExpanderState {
    fn default() -> Self {
        Self {
            iodir: 0xFF,
            gppu: 0,
            olat: 0,
        }
    }
}

/// Emulated SPI IP core
pub struct DummySpi {
    config: DummyConfig,
    tx_fifo: VecDeque<u32>,
    rx: u32,
    overflow: bool,
    control: u32,
    brd: u32,
    stall: u32,
    expander: ExpanderState,
    inputs: u8,
    port_reads: u32,
    sent: VecDeque<u32>,
    elapsed_us: u64,
}

impl DummySpi {
    /// Create a new emulated core with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            stall: config.stall_polls,
            inputs: config.inputs,
            config,
            tx_fifo: VecDeque::new(),
            rx: 0,
            overflow: false,
            control: 0,
            brd: 0,
            expander: ExpanderState::default(),
            port_reads: 0,
            sent: VecDeque::with_capacity(SENT_HISTORY),
            elapsed_us: 0,
        }
    }

    /// Create a new emulated core with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Frames still waiting in the TX FIFO
    pub fn tx_pending(&self) -> usize {
        self.tx_fifo.len()
    }

    /// Most recent frames shifted out (at most [`SENT_HISTORY`]), oldest first
    pub fn sent(&self) -> Vec<u32> {
        self.sent.iter().copied().collect()
    }

    /// Expander register state
    pub fn expander(&self) -> ExpanderState {
        self.expander
    }

    /// Change the externally driven pin levels
    pub fn set_inputs(&mut self, inputs: u8) {
        self.inputs = inputs;
    }

    /// Total time spent in `delay_us`
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    fn enabled(&self) -> bool {
        self.control & ENABLE != 0
    }

    fn status(&self) -> u32 {
        let mut status = 0;
        if self.overflow {
            status |= STATUS_TX_OVERFLOW;
        }
        if self.tx_fifo.len() >= self.config.fifo_depth {
            status |= STATUS_TX_FULL;
        }
        if self.tx_fifo.is_empty() {
            status |= STATUS_TX_EMPTY;
        }
        status
    }

    /// Shift out one frame if the core is running
    fn tick(&mut self) {
        if !self.enabled() || self.tx_fifo.is_empty() {
            return;
        }
        if self.stall > 0 {
            self.stall -= 1;
            return;
        }
        if let Some(frame) = self.tx_fifo.pop_front() {
            self.stall = self.config.stall_polls;
            self.rx = self.transfer(frame);
            if self.sent.len() == SENT_HISTORY {
                self.sent.pop_front();
            }
            self.sent.push_back(frame);
        }
    }

    fn port(&mut self) -> u8 {
        self.port_reads = self.port_reads.saturating_add(1);
        if let Some(after) = self.config.press_after {
            if self.port_reads > after {
                self.inputs &= !(1 << BUTTON_PIN);
            }
        }
        let e = &self.expander;
        (self.inputs & e.iodir) | (e.olat & !e.iodir)
    }

    /// Expander side of one frame, returning the reply word
    fn transfer(&mut self, frame: u32) -> u32 {
        let opcode = (frame >> 16) as u8;
        let reg = (frame >> 8) as u8;
        let value = frame as u8;

        if opcode & !OPCODE_READ != OPCODE {
            log::trace!("dummy: frame {:#08x} not addressed to the expander", frame);
            return 0;
        }

        if opcode & OPCODE_READ != 0 {
            let reply = match reg {
                IODIR => self.expander.iodir,
                GPPU => self.expander.gppu,
                GPIO => self.port(),
                _ => 0,
            };
            log::trace!("dummy: expander read {:#04x} -> {:#04x}", reg, reply);
            return u32::from(reply);
        }

        match reg {
            IODIR => self.expander.iodir = value,
            GPPU => self.expander.gppu = value,
            GPIO => self.expander.olat = value,
            _ => log::debug!("dummy: write to unmodelled expander register {:#04x}", reg),
        }
        0
    }
}

impl RegisterAccess for DummySpi {
    fn read(&mut self, reg: Register) -> u32 {
        match reg {
            Register::Data => core::mem::take(&mut self.rx),
            Register::Status => {
                self.tick();
                self.status()
            }
            Register::Control => self.control,
            Register::Brd => self.brd,
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        match reg {
            Register::Data => {
                if self.tx_fifo.len() >= self.config.fifo_depth {
                    log::debug!("dummy: TX FIFO overflow, dropping {:#010x}", value);
                    self.overflow = true;
                } else {
                    self.tx_fifo.push_back(value);
                }
            }
            Register::Status => {
                if value & STATUS_TX_OVERFLOW != 0 {
                    self.overflow = false;
                }
            }
            Register::Control => self.control = value,
            Register::Brd => self.brd = value,
        }
    }

    fn delay_us(&mut self, us: u32) {
        // No real delay for the emulator
        self.elapsed_us += u64::from(us);
    }
}
