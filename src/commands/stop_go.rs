//! Stop/go LED demo
//!
//! Board wiring on the GPIO expander:
//! - pin 0 drives the red LED
//! - pin 1 drives the green LED
//! - pin 2 reads the pushbutton, pulled high and shorted low when pressed

use std::error::Error;

use fpga_spi_core::gpio::{GpioExpander, Pin};
use fpga_spi_core::poll::PollPolicy;
use fpga_spi_core::{RegisterAccess, SpiController};

/// Red LED pin
pub const RED_LED: u8 = 0;
/// Green LED pin
pub const GREEN_LED: u8 = 1;
/// Pushbutton pin (active low)
pub const PUSH_BUTTON: u8 = 2;

/// Build the poll policy from the command line options
pub fn poll_policy(timeout_ms: Option<u32>, interval_us: u32) -> PollPolicy {
    let policy = match timeout_ms {
        Some(ms) => PollPolicy::with_timeout_us(ms.saturating_mul(1000)),
        None => PollPolicy::blocking(),
    };
    policy.interval_us(interval_us)
}

/// Show red until the pushbutton is pressed, then green
pub fn cmd_stop_go<R: RegisterAccess>(
    mut spi: SpiController<R>,
    policy: PollPolicy,
) -> Result<SpiController<R>, Box<dyn Error>> {
    if !spi.is_enabled() {
        return Err("SPI core is disabled (use 'fpga-spi write enable')".into());
    }

    let red = Pin::new(RED_LED)?;
    let green = Pin::new(GREEN_LED)?;
    let button = Pin::new(PUSH_BUTTON)?;

    let mut gpio = GpioExpander::new(spi).with_poll_policy(policy);

    gpio.select_pin_direction_input(button);
    gpio.select_pin_direction_output(green);
    gpio.select_pin_direction_output(red);
    gpio.select_pin_pull_output(green);
    gpio.select_pin_pull_output(red);

    gpio.set_pin_value(green, false);
    gpio.set_pin_value(red, true);

    println!("Waiting for the pushbutton...");
    gpio.wait_for_level(button, false, &policy)
        .map_err(|e| format!("Pushbutton: {}", e))?;

    gpio.set_pin_value(red, false);
    gpio.set_pin_value(green, true);
    println!("Go");

    Ok(gpio.into_inner())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use fpga_spi_dummy::{DummyConfig, DummySpi};

    fn running(config: DummyConfig) -> SpiController<DummySpi> {
        let mut spi = SpiController::new(DummySpi::new(config));
        spi.enable();
        spi
    }

    #[test]
    fn test_poll_policy() {
        assert_eq!(poll_policy(None, 8), PollPolicy::blocking());
        assert_eq!(poll_policy(Some(2), 50).timeout_us, Some(2000));
        assert_eq!(poll_policy(Some(u32::MAX), 8).timeout_us, Some(u32::MAX));
    }

    #[test]
    fn test_stop_go_sequence() {
        let config = DummyConfig {
            press_after: Some(5),
            ..Default::default()
        };
        let policy = poll_policy(Some(1000), 10);
        let mut spi = cmd_stop_go(running(config), policy).unwrap();

        // drain the final LED writes
        while !spi.read_status_flags().tx_empty() {}
        let state = spi.inner().expander();
        assert_eq!(state.iodir, 0xFC);
        assert_eq!(state.gppu, 0x03);
        assert_eq!(state.olat, 1 << GREEN_LED);
    }

    #[test]
    fn test_stop_go_times_out_without_press() {
        let policy = poll_policy(Some(1), 100);
        let err = cmd_stop_go(running(DummyConfig::default()), policy)
            .err()
            .expect("button never pressed");
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_stop_go_requires_enabled_core() {
        let spi = SpiController::new(DummySpi::new_default());
        assert!(cmd_stop_go(spi, PollPolicy::with_timeout_us(100)).is_err());
    }
}
