//! Recorded traffic as a bus, one candump line per frame

use std::io::{BufRead, Lines};
use std::time::Duration;

use log::warn;

use super::{CanBus, Frame};
use crate::error::{Error, Result};

/// Plays back candump lines from any reader.
///
/// Blank lines and lines starting with `;` or `#` are skipped. A line that
/// does not parse is reported as a receive error so the loop logs it and
/// moves on. End of input, or a reader that fails, is [`Error::Closed`].
pub struct ReplayBus<R> {
    lines: Lines<R>,
    controller: u8,
    line_no: usize,
    closed: bool,
}

impl<R: BufRead> ReplayBus<R> {
    pub fn new(controller: u8, reader: R) -> Self {
        Self {
            lines: reader.lines(),
            controller,
            line_no: 0,
            closed: false,
        }
    }

    /// Number of lines consumed so far
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> CanBus for ReplayBus<R> {
    fn receive(&mut self, _timeout: Option<Duration>) -> Result<Frame> {
        while !self.closed {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    warn!("Replay input unreadable after line {}: {}", self.line_no, e);
                    self.closed = true;
                    break;
                }
                None => {
                    self.closed = true;
                    break;
                }
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
                continue;
            }
            return trimmed.parse();
        }
        Err(Error::Closed)
    }

    fn controller(&self) -> u8 {
        self.controller
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::{self, BufReader, Read};
    use std::rc::Rc;

    /// A reader that never produces a byte, like stdin redirected from a directory
    pub(crate) struct Unreadable {
        pub(crate) attempts: Rc<Cell<usize>>,
    }

    impl Read for Unreadable {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.attempts.set(self.attempts.get() + 1);
            Err(io::Error::new(io::ErrorKind::Other, "Is a directory (os error 21)"))
        }
    }

    #[test]
    fn replays_frames_then_closes() {
        let input = "# recorded on the bench\n130#0000210000000000\n\n200#01\n";
        let mut bus = ReplayBus::new(0, input.as_bytes());

        let first = bus.receive(None).unwrap();
        assert_eq!(first.raw_id(), 0x130);
        assert_eq!(first.bytes()[2], 0x21);

        let second = bus.receive(None).unwrap();
        assert_eq!(second.raw_id(), 0x200);

        assert!(matches!(bus.receive(None), Err(Error::Closed)));
        assert!(matches!(bus.receive(None), Err(Error::Closed)));
        assert_eq!(bus.line_no(), 4);
    }

    #[test]
    fn bad_line_does_not_end_replay() {
        let mut bus = ReplayBus::new(1, "nonsense\n130#000061\n".as_bytes());

        assert!(matches!(bus.receive(None), Err(Error::FrameParse { .. })));
        assert_eq!(bus.receive(None).unwrap().bytes()[2], 0x61);
        assert_eq!(bus.controller(), 1);
    }

    #[test]
    fn empty_input_is_closed() {
        let mut bus = ReplayBus::new(1, std::io::empty());
        assert!(matches!(bus.receive(Some(Duration::from_millis(1))), Err(Error::Closed)));
    }

    #[test]
    fn failing_reader_closes_the_replay_for_good() {
        let attempts = Rc::new(Cell::new(0));
        let reader = BufReader::new(Unreadable {
            attempts: Rc::clone(&attempts),
        });
        let mut bus = ReplayBus::new(0, reader);

        assert!(matches!(bus.receive(None), Err(Error::Closed)));
        assert!(matches!(bus.receive(None), Err(Error::Closed)));
        assert_eq!(attempts.get(), 1);
        assert_eq!(bus.line_no(), 0);
    }
}
