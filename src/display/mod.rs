//! Display subsystem
//!
//! A [`Panel`] is the bare hardware: backlight, brightness and a full-screen
//! fill. [`Screen`] wraps it with the color currently shown, and
//! [`DisplayHandle`] shares one screen between the CAN loop and the touch
//! worker. Locking the handle is the only way to reach the screen; dropping
//! the guard unlocks it.

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use display_interface::DisplayError;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use crate::classify::DisplayState;
use crate::error::{Error, Result};

pub mod memory;

pub use memory::MemoryPanel;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// `0xRRGGBB` to a color
pub fn rgb(hex: u32) -> Rgb888 {
    Rgb888::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// A color to `0xRRGGBB`
pub fn hex(color: Rgb888) -> u32 {
    (u32::from(color.r()) << 16) | (u32::from(color.g()) << 8) | u32::from(color.b())
}

/// The hardware side of the screen, initialized by its constructor
pub trait Panel: Send {
    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError>;

    /// `percent` is already checked to be 0-100
    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError>;

    /// Paint the whole screen in one color
    fn fill_background(&mut self, color: Rgb888) -> Result<(), DisplayError>;
}

/// A panel plus the background it currently shows
pub struct Screen<P> {
    panel: P,
    background: Option<Rgb888>,
}

impl<P: Panel> Screen<P> {
    fn new(panel: P) -> Self {
        Self {
            panel,
            background: None,
        }
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.panel.set_backlight(on)?;
        Ok(())
    }

    pub fn set_brightness(&mut self, percent: u8) -> Result<()> {
        if percent > 100 {
            return Err(Error::InvalidBrightness(percent));
        }
        self.panel.set_brightness(percent)?;
        Ok(())
    }

    /// Repaint unless the color is already up. Returns whether the panel was touched.
    pub fn set_background(&mut self, color: Rgb888) -> Result<bool> {
        if self.background == Some(color) {
            return Ok(false);
        }
        self.panel.fill_background(color)?;
        self.background = Some(color);
        Ok(true)
    }

    /// [`Screen::set_background`] taking `0xRRGGBB`
    pub fn set_background_color(&mut self, hex: u32) -> Result<bool> {
        self.set_background(rgb(hex))
    }

    pub fn background(&self) -> Option<Rgb888> {
        self.background
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }
}

/// Shared access to one [`Screen`]
pub struct DisplayHandle<P> {
    inner: Arc<Mutex<Screen<P>>>,
}

impl<P> Clone for DisplayHandle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Panel> DisplayHandle<P> {
    pub fn new(panel: P) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Screen::new(panel))),
        }
    }

    /// Take exclusive access to the screen, `None` waits forever
    pub fn lock(&self, timeout: Option<Duration>) -> Result<MutexGuard<'_, Screen<P>>> {
        let Some(timeout) = timeout else {
            return self.inner.lock().map_err(|_| Error::LockPoisoned);
        };

        let started = Instant::now();
        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(_)) => return Err(Error::LockPoisoned),
                Err(TryLockError::WouldBlock) if started.elapsed() >= timeout => {
                    return Err(Error::LockTimeout)
                }
                Err(TryLockError::WouldBlock) => thread::sleep(LOCK_POLL_INTERVAL),
            }
        }
    }

    /// Lock, paint the state's color, unlock. Returns whether the panel was repainted.
    pub fn apply(&self, state: DisplayState, timeout: Option<Duration>) -> Result<bool> {
        let mut screen = self.lock(timeout)?;
        screen.set_background(state.color())
    }

    /// Color on screen right now, waits for the lock
    pub fn background(&self) -> Result<Option<Rgb888>> {
        Ok(self.lock(None)?.background())
    }
}
