//! CAN (TWAI) bus abstraction
//!
//! The main loop only needs two things from a bus: a blocking receive with an
//! optional timeout, and the controller number for log messages. The ESP-IDF
//! driver lives in `esp::twai`, [`replay::ReplayBus`] feeds recorded
//! traffic on the host.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use embedded_can::Frame as _;
pub use embedded_can::{ExtendedId, Id, StandardId};

use crate::error::{Error, Result};

pub mod replay;

/// One CAN data frame as read from a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    id: Id,
    dlc: u8,
    data: [u8; 8],
}

impl embedded_can::Frame for Frame {
    /// `None` when the payload is longer than 8 bytes
    fn new(id: impl Into<Id>, payload: &[u8]) -> Option<Self> {
        if payload.len() > 8 {
            return None;
        }
        let mut data = [0u8; 8];
        data[..payload.len()].copy_from_slice(payload);
        Some(Self {
            id: id.into(),
            dlc: payload.len() as u8,
            data,
        })
    }

    /// The controllers are only ever read for data frames
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        usize::from(self.dlc)
    }

    /// The bytes covered by the data length code
    fn data(&self) -> &[u8] {
        &self.data[..usize::from(self.dlc)]
    }
}

impl Frame {
    /// Frame exactly as the driver hands it over. The data length code is
    /// clamped to 8, bytes beyond it are kept as received.
    pub fn from_raw(id: Id, dlc: u8, data: [u8; 8]) -> Self {
        Self {
            id,
            dlc: dlc.min(8),
            data,
        }
    }

    /// Identifier as a plain number, standard or extended
    pub fn raw_id(&self) -> u32 {
        match self.id {
            Id::Standard(id) => u32::from(id.as_raw()),
            Id::Extended(id) => id.as_raw(),
        }
    }

    /// All eight data bytes, regardless of the data length code
    pub fn bytes(&self) -> &[u8; 8] {
        &self.data
    }
}

/// Identifier from a driver's raw fields, `None` when out of range
pub fn id_from_raw(raw: u32, extended: bool) -> Option<Id> {
    if extended {
        ExtendedId::new(raw).map(Id::Extended)
    } else {
        u16::try_from(raw).ok().and_then(StandardId::new).map(Id::Standard)
    }
}

/// candump notation, `130#0000210000000000`
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extended() {
            write!(f, "{:08X}#", self.raw_id())?;
        } else {
            write!(f, "{:03X}#", self.raw_id())?;
        }
        for byte in self.data() {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Parses candump notation. Both the compact form (`130#00002100`) and a full
/// log line (`(1697.1) can0 130#00002100`) are accepted, identifiers with more
/// than three hex digits are extended.
impl FromStr for Frame {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let fail = |reason| Error::FrameParse {
            line: line.to_string(),
            reason,
        };

        let token = line.split_whitespace().last().ok_or_else(|| fail("empty line"))?;
        let (id, data) = token.split_once('#').ok_or_else(|| fail("missing '#'"))?;

        if data.starts_with('R') {
            return Err(fail("remote frames are not supported"));
        }
        if id.is_empty() || id.len() > 8 {
            return Err(fail("identifier must be 1-8 hex digits"));
        }
        let raw_id = u32::from_str_radix(id, 16).map_err(|_| fail("identifier is not hex"))?;

        if data.len() % 2 != 0 {
            return Err(fail("odd number of data digits"));
        }
        if data.len() > 16 {
            return Err(fail("more than 8 data bytes"));
        }
        let mut payload = [0u8; 8];
        for (i, pair) in data.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(pair).map_err(|_| fail("data is not hex"))?;
            payload[i] = u8::from_str_radix(pair, 16).map_err(|_| fail("data is not hex"))?;
        }
        let payload = &payload[..data.len() / 2];

        let id = id_from_raw(raw_id, id.len() > 3).ok_or_else(|| fail("identifier out of range"))?;
        Frame::new(id, payload).ok_or_else(|| fail("more than 8 data bytes"))
    }
}

/// Bit timing, the same fields as `twai_timing_config_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub quanta_resolution_hz: u32,
    pub tseg_1: u8,
    pub tseg_2: u8,
    pub sjw: u8,
    pub triple_sampling: bool,
}

impl Timing {
    /// `TWAI_TIMING_CONFIG_500KBITS()`: 20 quanta per bit, sample point at 80 %
    pub const KBPS_500: Timing = Timing {
        quanta_resolution_hz: 10_000_000,
        tseg_1: 15,
        tseg_2: 4,
        sjw: 3,
        triple_sampling: false,
    };

    /// Time quanta in one bit, sync segment included
    pub fn quanta_per_bit(&self) -> u32 {
        1 + u32::from(self.tseg_1) + u32::from(self.tseg_2)
    }

    pub fn bits_per_second(&self) -> u32 {
        self.quanta_resolution_hz / self.quanta_per_bit()
    }
}

/// Hardware acceptance filter, the same fields as `twai_filter_config_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceFilter {
    pub code: u32,
    pub mask: u32,
    pub single: bool,
}

impl AcceptanceFilter {
    /// `TWAI_FILTER_CONFIG_ACCEPT_ALL()`
    pub const fn accept_all() -> Self {
        Self {
            code: 0,
            mask: 0xFFFF_FFFF,
            single: true,
        }
    }
}

/// Everything needed to install one TWAI controller in normal mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub controller: u8,
    pub tx_pin: i32,
    pub rx_pin: i32,
    pub timing: Timing,
    pub filter: AcceptanceFilter,
    pub tx_queue_len: u32,
    pub rx_queue_len: u32,
}

/// A started CAN controller the main loop can read from
pub trait CanBus {
    /// Wait for the next frame. `None` waits forever.
    ///
    /// Returns [`Error::Timeout`] when nothing arrived in time and
    /// [`Error::Closed`] when the source can never deliver again.
    fn receive(&mut self, timeout: Option<Duration>) -> Result<Frame>;

    /// Controller number, used in log messages
    fn controller(&self) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_can::Frame as _;

    fn standard(id: u16) -> Id {
        StandardId::new(id).unwrap().into()
    }

    #[test]
    fn new_rejects_oversized_payload() {
        assert!(Frame::new(standard(0x130), &[0; 9]).is_none());
        assert!(Frame::new_remote(standard(0x130), 0).is_none());
        assert!(Frame::new(ExtendedId::MAX, &[1]).unwrap().is_extended());
    }

    #[test]
    fn raw_identifiers_are_range_checked() {
        assert_eq!(id_from_raw(0x7FF, false), Some(standard(0x7FF)));
        assert_eq!(id_from_raw(0x800, false), None);
        assert_eq!(id_from_raw(0x1_0000, false), None);
        assert_eq!(id_from_raw(0x1FFF_FFFF, true), Some(Id::Extended(ExtendedId::MAX)));
        assert_eq!(id_from_raw(0x2000_0000, true), None);
    }

    #[test]
    fn short_payload_is_zero_padded() {
        let frame = Frame::new(standard(0x130), &[0xAA, 0xBB]).unwrap();
        assert_eq!(frame.dlc(), 2);
        assert_eq!(frame.data(), &[0xAA, 0xBB]);
        assert_eq!(frame.bytes(), &[0xAA, 0xBB, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn raw_frame_keeps_bytes_past_dlc() {
        let frame = Frame::from_raw(standard(0x130), 12, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(frame.dlc(), 8);

        let frame = Frame::from_raw(standard(0x130), 1, [1, 2, 0x21, 4, 5, 6, 7, 8]);
        assert_eq!(frame.data(), &[1]);
        assert_eq!(frame.bytes()[2], 0x21);
    }

    #[test]
    fn parses_compact_candump() {
        let frame: Frame = "130#0000210000000000".parse().unwrap();
        assert_eq!(frame.id(), standard(0x130));
        assert_eq!(frame.raw_id(), 0x130);
        assert!(frame.is_standard());
        assert_eq!(frame.dlc(), 8);
        assert_eq!(frame.bytes()[2], 0x21);
    }

    #[test]
    fn parses_candump_log_line() {
        let frame: Frame = "(1697040000.123456) can0 18FEF100#0102".parse().unwrap();
        assert_eq!(frame.raw_id(), 0x18FE_F100);
        assert!(frame.is_extended());
        assert_eq!(frame.data(), &[0x01, 0x02]);
    }

    #[test]
    fn parses_empty_payload() {
        let frame: Frame = "200#".parse().unwrap();
        assert_eq!(frame.raw_id(), 0x200);
        assert_eq!(frame.dlc(), 0);
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in ["", "130", "130#0", "xyz#00", "130#GG", "130#R", "130#000000000000000000", "900#00"] {
            let err = line.parse::<Frame>().unwrap_err();
            assert!(matches!(err, Error::FrameParse { .. }), "{line:?} gave {err:?}");
        }
    }

    #[test]
    fn display_is_candump_notation() {
        let frame = Frame::new(standard(0x130), &[0, 0, 0x61]).unwrap();
        assert_eq!(frame.to_string(), "130#000061");

        let frame = Frame::new(ExtendedId::new(0x42).unwrap(), &[0xFF]).unwrap();
        assert_eq!(frame.to_string(), "00000042#FF");
    }

    #[test]
    fn bus_timing_is_500_kbit() {
        assert_eq!(Timing::KBPS_500.quanta_per_bit(), 20);
        assert_eq!(Timing::KBPS_500.bits_per_second(), 500_000);
    }
}
