//! Binary event file layout.
//!
//! All values are little endian.
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0  | 4 | magic `RSEV` |
//! | 4  | 2 | format version (`1`) |
//! | 6  | 2 | event type tag: 0 plain, 1 weighted, 2 weighted-no-time |
//! | 8  | 4 | detector ID count (u32) |
//! | 12 | 4 | bin edge count (u32) |
//! | 16 | 8 | event count (u64) |
//! | 24 | .. | detector IDs (i32), bin edges (f64), events |
//!
//! Event records are `tof f64, pulse i64` (plain, 16 bytes),
//! `tof f64, pulse i64, weight f64, e2 f64` (weighted, 32 bytes) and
//! `tof f64, weight f64, e2 f64` (weighted-no-time, 24 bytes).

use crate::{Error, Result};
use rustevent_core::{EventType, TofEvent, WeightedEvent, WeightedEventNoTime};

/// File magic.
pub const MAGIC: [u8; 4] = *b"RSEV";

/// Current format version.
pub const FORMAT_VERSION: u16 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Fixed-size header at the start of an event file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Representation of the stored events.
    pub event_type: EventType,
    /// Number of detector IDs.
    pub detector_count: u32,
    /// Number of bin edges.
    pub edge_count: u32,
    /// Number of events.
    pub event_count: u64,
}

/// Numeric tag stored for an event type.
#[must_use]
pub fn type_tag(event_type: EventType) -> u16 {
    match event_type {
        EventType::Tof => 0,
        EventType::Weighted => 1,
        EventType::WeightedNoTime => 2,
    }
}

/// Event type for a stored tag.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] for unknown tags.
pub fn event_type_from_tag(tag: u16) -> Result<EventType> {
    match tag {
        0 => Ok(EventType::Tof),
        1 => Ok(EventType::Weighted),
        2 => Ok(EventType::WeightedNoTime),
        other => Err(Error::InvalidFormat(format!("unknown event type tag {other}"))),
    }
}

impl FileHeader {
    /// Serializes the header.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&MAGIC);
        out[4..6].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        out[6..8].copy_from_slice(&type_tag(self.event_type).to_le_bytes());
        out[8..12].copy_from_slice(&self.detector_count.to_le_bytes());
        out[12..16].copy_from_slice(&self.edge_count.to_le_bytes());
        out[16..24].copy_from_slice(&self.event_count.to_le_bytes());
        out
    }

    /// Parses and validates the header at the start of `data`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the data is too short, the magic
    /// or version do not match, or the type tag is unknown.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::InvalidFormat(format!(
                "file is {} bytes, shorter than the {HEADER_SIZE}-byte header",
                data.len()
            )));
        }
        if data[0..4] != MAGIC {
            return Err(Error::InvalidFormat("bad magic, not an event file".into()));
        }
        let version = u16::from_le_bytes([data[4], data[5]]);
        if version != FORMAT_VERSION {
            return Err(Error::InvalidFormat(format!(
                "unsupported format version {version}"
            )));
        }
        let event_type = event_type_from_tag(u16::from_le_bytes([data[6], data[7]]))?;
        Ok(Self {
            event_type,
            detector_count: read_u32(&data[8..12]),
            edge_count: read_u32(&data[12..16]),
            event_count: read_u64(&data[16..24]),
        })
    }

    /// Byte offset of the bin edges.
    #[must_use]
    pub fn edges_offset(&self) -> usize {
        HEADER_SIZE + self.detector_count as usize * 4
    }

    /// Byte offset of the first event record.
    #[must_use]
    pub fn events_offset(&self) -> usize {
        self.edges_offset() + self.edge_count as usize * 8
    }

    /// Total file length implied by the header, or `None` on overflow.
    #[must_use]
    pub fn expected_len(&self) -> Option<usize> {
        let events = usize::try_from(self.event_count).ok()?;
        events
            .checked_mul(self.event_type.event_size())?
            .checked_add(self.events_offset())
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

pub(crate) fn read_i32(bytes: &[u8]) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    i32::from_le_bytes(buf)
}

pub(crate) fn read_i64(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    i64::from_le_bytes(buf)
}

pub(crate) fn read_f64(bytes: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    f64::from_le_bytes(buf)
}

/// Fixed-size little-endian encoding of one event.
pub trait Record: Sized + Send + Sync {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Appends the encoded event to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Decodes one event from exactly [`Self::SIZE`] bytes.
    fn decode(bytes: &[u8]) -> Self;
}

impl Record for TofEvent {
    const SIZE: usize = 16;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tof.to_le_bytes());
        out.extend_from_slice(&self.pulse_time.as_nanoseconds().to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        Self::new(read_f64(&bytes[0..8]), read_i64(&bytes[8..16]))
    }
}

impl Record for WeightedEvent {
    const SIZE: usize = 32;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tof.to_le_bytes());
        out.extend_from_slice(&self.pulse_time.as_nanoseconds().to_le_bytes());
        out.extend_from_slice(&self.weight.to_le_bytes());
        out.extend_from_slice(&self.error_squared.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        Self::new(
            read_f64(&bytes[0..8]),
            read_i64(&bytes[8..16]),
            read_f64(&bytes[16..24]),
            read_f64(&bytes[24..32]),
        )
    }
}

impl Record for WeightedEventNoTime {
    const SIZE: usize = 24;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tof.to_le_bytes());
        out.extend_from_slice(&self.weight.to_le_bytes());
        out.extend_from_slice(&self.error_squared.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        Self::new(
            read_f64(&bytes[0..8]),
            read_f64(&bytes[8..16]),
            read_f64(&bytes[16..24]),
        )
    }
}
