//! GT911 touch controller through the board-support package

use std::ptr;

use esp_idf_svc::sys::{bsp, esp};

use super::esp_error;
use crate::error::{Error, Result};
use crate::input::{TouchPoint, TouchSensor};

pub struct BspTouch {
    handle: bsp::esp_lcd_touch_handle_t,
}

// Only the touch polling thread uses the handle
unsafe impl Send for BspTouch {}

impl BspTouch {
    pub fn new() -> Result<Self> {
        let config = bsp::bsp_touch_config_t::default();
        let mut handle: bsp::esp_lcd_touch_handle_t = ptr::null_mut();
        esp!(unsafe { bsp::bsp_touch_new(&config, &mut handle) })
            .map_err(|e| esp_error("bsp_touch_new", e))?;
        Ok(Self { handle })
    }
}

impl TouchSensor for BspTouch {
    fn read(&mut self) -> Result<Option<TouchPoint>> {
        esp!(unsafe { bsp::esp_lcd_touch_read_data(self.handle) })
            .map_err(|e| Error::Esp {
                op: "esp_lcd_touch_read_data",
                code: e.code(),
            })?;

        let mut x = 0u16;
        let mut y = 0u16;
        let mut strength = 0u16;
        let mut count = 0u8;
        let pressed = unsafe {
            bsp::esp_lcd_touch_get_coordinates(self.handle, &mut x, &mut y, &mut strength, &mut count, 1)
        };

        Ok((pressed && count > 0).then_some(TouchPoint { x, y }))
    }
}
