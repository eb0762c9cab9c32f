//! rustevent-io: Persistence for event lists.
//!
//! This crate provides a compact little-endian binary event file (written
//! with [`EventFileWriter`], read back through a memory map by
//! [`EventFileReader`]), lossless JSON snapshots of an
//! [`EventList`](rustevent_list::EventList), and CSV export of histograms.
//!

mod error;
pub mod format;
mod reader;
pub mod snapshot;
mod writer;

pub use error::{Error, Result};
pub use format::{FileHeader, FORMAT_VERSION, HEADER_SIZE, MAGIC};
pub use reader::{EventFileReader, MappedFileReader};
pub use snapshot::EventListSnapshot;
pub use writer::EventFileWriter;
