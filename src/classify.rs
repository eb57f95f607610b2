//! Maps clutch pedal frames to the color shown on screen

use std::fmt;

use embedded_graphics::pixelcolor::Rgb888;

use crate::can::Frame;
use crate::display::rgb;

/// Identifier of the frame carrying the clutch switch
pub const CLUTCH_FRAME_ID: u32 = 0x130;
/// Byte of [`CLUTCH_FRAME_ID`] holding the switch state
pub const CLUTCH_BYTE: usize = 2;
/// Switch value while the pedal is pushed down
pub const CLUTCH_DEPRESSED: u8 = 0x21;
/// Switch value while the pedal is up
pub const CLUTCH_RELEASED: u8 = 0x61;

/// What the screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayState {
    /// Nothing decoded yet
    Neutral,
    ClutchDepressed,
    ClutchReleased,
    /// Traffic other than the clutch frame
    Unknown,
}

impl DisplayState {
    /// Background color as `0xRRGGBB`
    pub const fn hex(self) -> u32 {
        match self {
            DisplayState::Neutral => 0xFFFFFF,
            DisplayState::ClutchDepressed => 0x0000FF,
            DisplayState::ClutchReleased => 0xFF0000,
            DisplayState::Unknown => 0xFF00FF,
        }
    }

    pub fn color(self) -> Rgb888 {
        rgb(self.hex())
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayState::Neutral => write!(f, "neutral"),
            DisplayState::ClutchDepressed => write!(f, "clutch depressed"),
            DisplayState::ClutchReleased => write!(f, "clutch released"),
            DisplayState::Unknown => write!(f, "other traffic"),
        }
    }
}

/// Decide what a frame means for the screen.
///
/// `None` means leave the screen alone: the clutch frame arrived but its
/// switch byte holds neither known value.
pub fn classify(frame: &Frame) -> Option<DisplayState> {
    if frame.raw_id() != CLUTCH_FRAME_ID {
        return Some(DisplayState::Unknown);
    }
    match frame.bytes()[CLUTCH_BYTE] {
        CLUTCH_DEPRESSED => Some(DisplayState::ClutchDepressed),
        CLUTCH_RELEASED => Some(DisplayState::ClutchReleased),
        _ => None,
    }
}
