//! ESP-IDF implementations of the bus, panel and touch traits
//!
//! Only built for `target_os = "espidf"`. The board-support package bindings
//! come from the `bsp` extra component declared in `Cargo.toml`.

use std::time::Duration;

use esp_idf_svc::hal::delay::BLOCK;
use esp_idf_svc::sys::{configTICK_RATE_HZ, EspError};

use crate::error::Error;

pub mod panel;
pub mod touch;
pub mod twai;

pub use panel::BspPanel;
pub use touch::BspTouch;
pub use twai::TwaiBus;

fn esp_error(op: &'static str, e: EspError) -> Error {
    log::error!("{} failed: {}", op, e);
    Error::Esp { op, code: e.code() }
}

/// FreeRTOS ticks for a timeout, rounded up. `None` blocks forever.
fn ticks(timeout: Option<Duration>) -> u32 {
    match timeout {
        None => BLOCK,
        Some(timeout) => {
            let ticks = (timeout.as_millis() * u128::from(configTICK_RATE_HZ)).div_ceil(1000);
            u32::try_from(ticks).unwrap_or(BLOCK)
        }
    }
}
