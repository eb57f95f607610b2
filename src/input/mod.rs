//! Touch input handling
//!
//! The whole panel acts as one invisible button. A worker thread samples the
//! touch controller, debounces the readings and queues press/release events
//! for whoever applies them to the screen.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::error::{Error, Result};

// Re-export the public types
pub mod types;
pub use types::*;

// Touch configuration
const DEBOUNCE_MS: u32 = 50; // A new state must hold this long before it is reported
const WORKER_STACK_SIZE: usize = 8192;

/// Something that can tell whether, and where, the panel is touched
pub trait TouchSensor: Send + 'static {
    /// Current reading, `None` when nothing touches the panel.
    ///
    /// [`Error::Closed`] stops the monitor.
    fn read(&mut self) -> Result<Option<TouchPoint>>;
}

/// Turns raw readings into press/release edges
#[derive(Debug)]
pub struct TouchDebouncer {
    state: TouchState,
    pending: u32,
    required: u32,
}

impl TouchDebouncer {
    /// `poll_ms` is the interval between two readings
    pub fn new(poll_ms: u32) -> Self {
        Self {
            state: TouchState::Released,
            pending: 0,
            required: DEBOUNCE_MS.div_ceil(poll_ms.max(1)).max(1),
        }
    }

    /// Debounced state as of the last reading
    pub fn state(&self) -> TouchState {
        self.state
    }

    /// Feed one reading, returns an event once a new state has held long enough
    pub fn update(&mut self, reading: Option<TouchPoint>) -> Option<TouchEvent> {
        let observed = if reading.is_some() {
            TouchState::Pressed
        } else {
            TouchState::Released
        };

        if observed == self.state {
            self.pending = 0;
            return None;
        }

        self.pending += 1;
        if self.pending < self.required {
            return None;
        }

        self.pending = 0;
        self.state = observed;
        Some(match reading {
            Some(point) => TouchEvent::Pressed(point),
            None => TouchEvent::Released,
        })
    }
}

/// Polls a [`TouchSensor`] on its own thread and queues the events
pub struct TouchMonitor {
    events: Receiver<TouchEvent>,
}

impl TouchMonitor {
    /// Start polling `sensor` every `poll_ms` milliseconds
    pub fn spawn<S, D>(sensor: S, delay: D, poll_ms: u32) -> Result<Self>
    where
        S: TouchSensor,
        D: DelayNs + Send + 'static,
    {
        let (sender, events) = mpsc::channel();

        // Detached, it stops on its own once `events` is dropped or the sensor closes
        thread::Builder::new()
            .name("touch".into())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || poll(sensor, delay, poll_ms, sender))?;

        Ok(Self { events })
    }

    /// Wait for and return the next touch event, `None` once the sensor is gone
    pub fn wait_for_event(&self) -> Option<TouchEvent> {
        self.events.recv().ok()
    }
}

fn poll<S: TouchSensor, D: DelayNs>(mut sensor: S, mut delay: D, poll_ms: u32, sender: Sender<TouchEvent>) {
    let mut debouncer = TouchDebouncer::new(poll_ms);
    let mut failing = false;

    info!("Touch polling started, every {} ms", poll_ms);
    loop {
        match sensor.read() {
            Ok(reading) => {
                failing = false;
                if let Some(event) = debouncer.update(reading) {
                    if sender.send(event).is_err() {
                        break;
                    }
                }
            }
            Err(Error::Closed) => break,
            Err(e) => {
                // Only the first error of a streak, the controller may stay unreachable
                if !failing {
                    warn!("Touch read failed: {}", e);
                }
                failing = true;
            }
        }
        delay.delay_ms(poll_ms);
    }
    info!("Touch polling stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    const P: TouchPoint = TouchPoint { x: 512, y: 300 };

    struct ScriptedSensor {
        script: VecDeque<Result<Option<TouchPoint>>>,
    }

    impl ScriptedSensor {
        fn new(script: impl IntoIterator<Item = Result<Option<TouchPoint>>>) -> Self {
            Self {
                script: script.into_iter().collect(),
            }
        }
    }

    impl TouchSensor for ScriptedSensor {
        fn read(&mut self) -> Result<Option<TouchPoint>> {
            self.script.pop_front().unwrap_or(Err(Error::Closed))
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn debouncer_needs_a_stable_reading() {
        let mut debouncer = TouchDebouncer::new(10);

        for _ in 0..4 {
            assert_eq!(debouncer.update(Some(P)), None);
        }
        assert_eq!(debouncer.update(Some(P)), Some(TouchEvent::Pressed(P)));
        assert_eq!(debouncer.state(), TouchState::Pressed);
        assert_eq!(debouncer.update(Some(P)), None);
    }

    #[test]
    fn debouncer_ignores_glitches() {
        let mut debouncer = TouchDebouncer::new(10);

        for _ in 0..3 {
            assert_eq!(debouncer.update(Some(P)), None);
        }
        assert_eq!(debouncer.update(None), None);
        for _ in 0..4 {
            assert_eq!(debouncer.update(Some(P)), None);
        }
        assert_eq!(debouncer.state(), TouchState::Released);
    }

    #[test]
    fn slow_polling_reports_immediately() {
        let mut debouncer = TouchDebouncer::new(100);
        assert_eq!(debouncer.update(Some(P)), Some(TouchEvent::Pressed(P)));
        assert_eq!(debouncer.update(None), Some(TouchEvent::Released));

        let mut debouncer = TouchDebouncer::new(0);
        assert_eq!(debouncer.update(Some(P)), None);
    }

    #[test]
    fn monitor_queues_press_and_release() {
        let mut script = Vec::new();
        script.extend((0..3).map(|_| Ok(Some(P))));
        script.push(Err(Error::Esp { op: "esp_lcd_touch_read_data", code: 0x107 }));
        script.extend((0..3).map(|_| Ok(None)));

        let monitor = TouchMonitor::spawn(ScriptedSensor::new(script), NoDelay, 30).unwrap();

        assert_eq!(monitor.wait_for_event(), Some(TouchEvent::Pressed(P)));
        assert_eq!(monitor.wait_for_event(), Some(TouchEvent::Released));
        assert_eq!(monitor.wait_for_event(), None);
        assert_eq!(monitor.wait_for_event(), None);
    }

    #[test]
    fn touch_events_use_pedal_colors() {
        assert_eq!(TouchEvent::Pressed(P).display_state().hex(), 0x0000FF);
        assert_eq!(TouchEvent::Released.display_state().hex(), 0xFF0000);
        assert_eq!(TouchEvent::Released.state(), TouchState::Released);
        assert_eq!(TouchEvent::Pressed(P).to_string(), "Pressed at (512, 300)");
    }
}
