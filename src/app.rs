//! The receive, classify, render loop and the touch overlay worker

use std::time::Duration;

use log::{debug, info, warn};

use crate::can::CanBus;
use crate::classify::{classify, DisplayState, CLUTCH_FRAME_ID};
use crate::display::{DisplayHandle, Panel};
use crate::error::{Error, Result};
use crate::input::{TouchEvent, TouchMonitor};

/// Everything the main loop owns: both controllers and the shared display
pub struct Context<B, S, P> {
    primary: B,
    secondary: S,
    display: DisplayHandle<P>,
    receive_timeout: Option<Duration>,
    lock_timeout: Option<Duration>,
}

impl<B, S, P> Context<B, S, P>
where
    B: CanBus,
    S: CanBus,
    P: Panel,
{
    /// Frames are read from `primary`. `secondary` is only kept running.
    pub fn new(primary: B, secondary: S, display: DisplayHandle<P>) -> Self {
        Self {
            primary,
            secondary,
            display,
            receive_timeout: None,
            lock_timeout: None,
        }
    }

    /// How long one receive may block, `None` is forever
    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// How long to wait for the display lock, `None` is forever
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn primary(&self) -> &B {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }

    pub fn display(&self) -> &DisplayHandle<P> {
        &self.display
    }

    /// One iteration: receive a frame, classify it, paint it.
    ///
    /// Returns the state that was applied, `None` when the frame asked for no change.
    pub fn step(&mut self) -> Result<Option<DisplayState>> {
        let frame = self.primary.receive(self.receive_timeout)?;

        if frame.raw_id() == CLUTCH_FRAME_ID {
            info!("0x{:03X} frame received: {}", CLUTCH_FRAME_ID, frame);
        }

        let Some(state) = classify(&frame) else {
            return Ok(None);
        };

        match state {
            DisplayState::ClutchDepressed => info!("Clutch depressed, changing color to blue"),
            DisplayState::ClutchReleased => info!("Clutch not depressed, changing color to red"),
            _ => debug!("{} ({}), background #{:06X}", state, frame, state.hex()),
        }

        self.display.apply(state, self.lock_timeout)?;
        Ok(Some(state))
    }

    /// Run until the bus closes, which hardware buses never do.
    ///
    /// Receive and display failures are logged and the loop carries on.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "Listening on CAN controller {} (controller {} idle)",
            self.primary.controller(),
            self.secondary.controller()
        );
        loop {
            match self.step() {
                Ok(_) => {}
                Err(Error::Closed) => {
                    info!("CAN controller {} closed", self.primary.controller());
                    return Ok(());
                }
                Err(e @ (Error::LockTimeout | Error::LockPoisoned | Error::Display(_))) => {
                    warn!("Could not update display: {}", e);
                }
                Err(e) => warn!("Failed to receive any CAN data: {}", e),
            }
        }
    }
}

/// Apply touch events to the display until the monitor stops
pub fn run_touch_overlay<P: Panel>(
    monitor: &TouchMonitor,
    display: &DisplayHandle<P>,
    lock_timeout: Option<Duration>,
) {
    while let Some(event) = monitor.wait_for_event() {
        let state = event.display_state();
        match event {
            TouchEvent::Pressed(point) => info!("Touch pressed at {}, changed color to blue", point),
            TouchEvent::Released => info!("Touch released, changed color to red"),
        }
        if let Err(e) = display.apply(state, lock_timeout) {
            warn!("Could not update display: {}", e);
        }
    }
}
