//! Panel that only remembers what it was asked to do
//!
//! Stands in for the DSI panel when replaying traffic on the host and in tests.

use display_interface::DisplayError;
use embedded_graphics::pixelcolor::Rgb888;

use super::{hex, Panel};

#[derive(Debug, Default)]
pub struct MemoryPanel {
    backlight: bool,
    brightness: u8,
    fills: Vec<u32>,
    fail_next_fill: bool,
}

impl MemoryPanel {
    pub fn backlight(&self) -> bool {
        self.backlight
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Every fill so far as `0xRRGGBB`, oldest first
    pub fn fills(&self) -> &[u32] {
        &self.fills
    }

    /// Make the next [`Panel::fill_background`] fail like a bus write error
    pub fn fail_next_fill(&mut self) {
        self.fail_next_fill = true;
    }
}

impl Panel for MemoryPanel {
    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        self.backlight = on;
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        self.brightness = percent;
        Ok(())
    }

    fn fill_background(&mut self, color: Rgb888) -> Result<(), DisplayError> {
        if std::mem::take(&mut self.fail_next_fill) {
            return Err(DisplayError::BusWriteError);
        }
        self.fills.push(hex(color));
        Ok(())
    }
}
