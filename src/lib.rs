//! Clutch pedal indicator
//!
//! Listens to CAN traffic on an ESP32-P4 and paints the whole touch display
//! in a color that tells whether the clutch pedal is pushed down:
//!
//! | Traffic                             | Background |
//! |-------------------------------------|------------|
//! | `0x130`, byte 2 = `0x21`            | blue       |
//! | `0x130`, byte 2 = `0x61`            | red        |
//! | `0x130`, any other byte 2           | unchanged  |
//! | any other identifier                | magenta    |
//!
//! Touching the screen shows blue, letting go shows red.
//!
//! Everything outside [`esp`] is plain Rust and runs on the host, which is
//! where the tests live.

pub mod app;
pub mod can;
pub mod classify;
pub mod config;
pub mod display;
pub mod error;
pub mod input;

#[cfg(not(target_os = "espidf"))]
pub mod logging;

#[cfg(target_os = "espidf")]
pub mod esp;

pub use crate::app::{run_touch_overlay, Context};
pub use crate::can::{BusConfig, CanBus, Frame};
pub use crate::classify::{classify, DisplayState};
pub use crate::display::{DisplayHandle, Panel};
pub use crate::error::{Error, Result};
