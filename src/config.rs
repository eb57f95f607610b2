//! Compile-time configuration for the Waveshare ESP32-P4-WIFI6-Touch-LCD-XC
//!
//! The firmware has no runtime configuration surface, everything that differs
//! between boards lives here.

use std::time::Duration;

use crate::can::{AcceptanceFilter, BusConfig, Timing};

/// Pin configuration constants for the two TWAI transceivers
pub struct Pins;

impl Pins {
    /// TWAI controller 0 transmit
    pub const TWAI0_TX: i32 = 21;
    /// TWAI controller 0 receive
    pub const TWAI0_RX: i32 = 22;
    /// TWAI controller 1 transmit
    pub const TWAI1_TX: i32 = 47;
    /// TWAI controller 1 receive
    pub const TWAI1_RX: i32 = 27;
}

/// Resolution of the 7 inch MIPI-DSI panel
pub const PANEL_WIDTH: u32 = 1024;
pub const PANEL_HEIGHT: u32 = 600;

/// Backlight level applied right after the panel comes up
pub const BRIGHTNESS_PERCENT: u8 = 100;

/// `None` waits for the display lock forever, like `bsp_display_lock(0)`
pub const DISPLAY_LOCK_TIMEOUT: Option<Duration> = None;

/// `None` blocks on the bus forever (`portMAX_DELAY`)
pub const RECEIVE_TIMEOUT: Option<Duration> = None;

/// How often the touch controller is sampled
pub const TOUCH_POLL_MS: u32 = 10;

/// Depth of both TWAI driver queues
pub const TWAI_QUEUE_LEN: u32 = 5;

/// Controller 0, the one the main loop reads from
pub fn primary_bus() -> BusConfig {
    BusConfig::default()
}

/// Controller 1, configured and started but not read
pub fn secondary_bus() -> BusConfig {
    BusConfig {
        controller: 1,
        tx_pin: Pins::TWAI1_TX,
        rx_pin: Pins::TWAI1_RX,
        ..BusConfig::default()
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            controller: 0,
            tx_pin: Pins::TWAI0_TX,
            rx_pin: Pins::TWAI0_RX,
            timing: Timing::KBPS_500,
            filter: AcceptanceFilter::accept_all(),
            tx_queue_len: TWAI_QUEUE_LEN,
            rx_queue_len: TWAI_QUEUE_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_controllers_share_timing_and_filter() {
        let primary = primary_bus();
        let secondary = secondary_bus();

        assert_eq!(primary.controller, 0);
        assert_eq!((primary.tx_pin, primary.rx_pin), (21, 22));
        assert_eq!(secondary.controller, 1);
        assert_eq!((secondary.tx_pin, secondary.rx_pin), (47, 27));

        assert_eq!(primary.timing.bits_per_second(), 500_000);
        assert_eq!(primary.timing, secondary.timing);
        assert_eq!(primary.filter, AcceptanceFilter::accept_all());
        assert_eq!(primary.filter, secondary.filter);
        assert_eq!((secondary.tx_queue_len, secondary.rx_queue_len), (5, 5));
    }
}
