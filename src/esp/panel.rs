//! MIPI-DSI panel brought up through the board-support package
//!
//! The BSP owns the DSI bus, the ILI9881C/EK79007 controller init sequence
//! and the backlight PWM. This driver only pushes RGB565 rows into the DPI
//! framebuffer with `esp_lcd_panel_draw_bitmap`, and is an
//! [`embedded_graphics`] draw target so anything can be drawn on it.
//!
//! The copy into the framebuffer may run on DMA2D after `draw_bitmap`
//! returns, so every draw waits for `on_color_trans_done` before the source
//! buffer is touched again.

use core::ffi::c_void;
use std::ptr;

use display_interface::DisplayError;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use esp_idf_svc::hal::delay::BLOCK;
use esp_idf_svc::sys::{self, bsp, esp, EspError};
use log::{info, warn};

use super::esp_error;
use crate::config::{PANEL_HEIGHT, PANEL_WIDTH};
use crate::display::Panel;
use crate::error::Result;

pub struct BspPanel {
    panel: sys::esp_lcd_panel_handle_t,
    /// Given from ISR context once a `draw_bitmap` copy has finished
    draw_done: sys::SemaphoreHandle_t,
    line: Vec<u16>,
}

/// `queueQUEUE_TYPE_BINARY_SEMAPHORE`, a macro bindgen does not export
const QUEUE_TYPE_BINARY_SEMAPHORE: u8 = 3;

// The handles are plain pointers into the ESP-IDF LCD driver, access is serialized by `DisplayHandle`
unsafe impl Send for BspPanel {}

impl BspPanel {
    /// Initialize the DSI bus and the panel controller
    pub fn new() -> Result<Self> {
        let config = bsp::bsp_display_config_t::default();
        let mut panel: sys::esp_lcd_panel_handle_t = ptr::null_mut();
        // DBI control channel, only needed by the BSP during init
        let mut io: sys::esp_lcd_panel_io_handle_t = ptr::null_mut();

        esp!(unsafe {
            bsp::bsp_display_new(
                &config,
                (&mut panel as *mut sys::esp_lcd_panel_handle_t).cast(),
                (&mut io as *mut sys::esp_lcd_panel_io_handle_t).cast(),
            )
        })
        .map_err(|e| esp_error("bsp_display_new", e))?;

        // DPI panels are always on and answer ESP_ERR_NOT_SUPPORTED
        if let Err(e) = esp!(unsafe { sys::esp_lcd_panel_disp_on_off(panel, true) }) {
            warn!("Panel on/off not supported: {}", e);
        }

        let draw_done = unsafe { sys::xQueueGenericCreate(1, 0, QUEUE_TYPE_BINARY_SEMAPHORE) };
        if draw_done.is_null() {
            return Err(esp_error("xQueueGenericCreate", EspError::from_infallible::<{ sys::ESP_ERR_NO_MEM }>()));
        }
        let callbacks = sys::esp_lcd_dpi_panel_event_callbacks_t {
            on_color_trans_done: Some(on_color_trans_done),
            ..unsafe { core::mem::zeroed() }
        };
        if let Err(e) = esp!(unsafe { sys::esp_lcd_dpi_panel_register_event_callbacks(panel, &callbacks, draw_done.cast()) }) {
            unsafe { sys::vQueueDelete(draw_done) };
            return Err(esp_error("esp_lcd_dpi_panel_register_event_callbacks", e));
        }

        info!("Panel ready, {}x{}", PANEL_WIDTH, PANEL_HEIGHT);
        Ok(Self {
            panel,
            draw_done,
            line: Vec::with_capacity(PANEL_WIDTH as usize),
        })
    }

    /// Copy one horizontal run of pixels starting at (x, y) and wait until
    /// the copy is done
    fn draw_span(&self, x: i32, y: i32, pixels: &[u16]) -> Result<(), DisplayError> {
        let err = unsafe {
            sys::esp_lcd_panel_draw_bitmap(
                self.panel,
                x,
                y,
                x + pixels.len() as i32,
                y + 1,
                pixels.as_ptr() as *const c_void,
            )
        };
        esp!(err).map_err(|e| {
            log::error!("Draw at ({}, {}) failed: {}", x, y, e);
            DisplayError::BusWriteError
        })?;
        unsafe { sys::xQueueSemaphoreTake(self.draw_done, BLOCK) };
        Ok(())
    }
}

impl Drop for BspPanel {
    fn drop(&mut self) {
        unsafe { sys::vQueueDelete(self.draw_done) };
    }
}

unsafe extern "C" fn on_color_trans_done(
    _panel: sys::esp_lcd_panel_handle_t,
    _edata: *mut sys::esp_lcd_dpi_panel_event_data_t,
    user_ctx: *mut c_void,
) -> bool {
    let mut woken: sys::BaseType_t = 0;
    sys::xQueueGiveFromISR(user_ctx as sys::SemaphoreHandle_t, &mut woken);
    woken != 0
}

impl OriginDimensions for BspPanel {
    fn size(&self) -> Size {
        Size::new(PANEL_WIDTH, PANEL_HEIGHT)
    }
}

impl DrawTarget for BspPanel {
    type Color = Rgb565;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                self.draw_span(point.x, point.y, &[color.into_storage()])?;
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };

        self.line.clear();
        self.line.resize(area.size.width as usize, color.into_storage());
        for y in area.top_left.y..=bottom_right.y {
            self.draw_span(area.top_left.x, y, &self.line)?;
        }
        Ok(())
    }
}

impl Panel for BspPanel {
    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        let err = if on {
            unsafe { bsp::bsp_display_backlight_on() }
        } else {
            unsafe { bsp::bsp_display_backlight_off() }
        };
        esp!(err).map_err(|e| {
            log::error!("Backlight switch failed: {}", e);
            DisplayError::BusWriteError
        })
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        esp!(unsafe { bsp::bsp_display_brightness_set(i32::from(percent)) }).map_err(|e| {
            log::error!("Setting brightness to {}% failed: {}", percent, e);
            DisplayError::BusWriteError
        })
    }

    fn fill_background(&mut self, color: Rgb888) -> Result<(), DisplayError> {
        self.clear(Rgb565::from(color))
    }
}
