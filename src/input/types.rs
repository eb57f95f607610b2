//! Types for touch handling

use crate::classify::DisplayState;

/// Panel coordinates of a touch, origin top left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

/// Touch state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchState {
    Pressed,
    Released,
}

/// Touch events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    Pressed(TouchPoint),
    Released,
}

impl TouchEvent {
    /// The overlay borrows the pedal colors: pressing shows blue, letting go shows red.
    pub fn display_state(&self) -> DisplayState {
        match self {
            TouchEvent::Pressed(_) => DisplayState::ClutchDepressed,
            TouchEvent::Released => DisplayState::ClutchReleased,
        }
    }

    pub fn state(&self) -> TouchState {
        match self {
            TouchEvent::Pressed(_) => TouchState::Pressed,
            TouchEvent::Released => TouchState::Released,
        }
    }
}

impl std::fmt::Display for TouchPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::fmt::Display for TouchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TouchEvent::Pressed(point) => write!(f, "Pressed at {}", point),
            TouchEvent::Released => write!(f, "Released"),
        }
    }
}
