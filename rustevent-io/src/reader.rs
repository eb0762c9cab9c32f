//! Memory-mapped event file readers.
//!

use crate::format::{read_f64, read_i32, FileHeader, Record};
use crate::{Error, Result};
use log::debug;
use memmap2::Mmap;
use rayon::prelude::*;
use rustevent_list::{BinEdges, DetectorId, EventList, EventType, Events};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Event records below this count are decoded on the calling thread.
const PARALLEL_DECODE_THRESHOLD: usize = 1 << 16;

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire file
/// into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Returns the path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reader for binary event files.
///
/// The header and total length are validated on open; sections are decoded
/// on demand straight from the mapping.
pub struct EventFileReader {
    reader: MappedFileReader,
    header: FileHeader,
}

impl EventFileReader {
    /// Opens and validates an event file.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the header is malformed or the
    /// file length does not match the counts it declares.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        let header = FileHeader::parse(reader.as_bytes())?;
        let expected = header.expected_len().ok_or_else(|| {
            Error::InvalidFormat(format!(
                "declared sizes overflow (file: {})",
                reader.path().display()
            ))
        })?;
        if reader.len() != expected {
            return Err(Error::InvalidFormat(format!(
                "file size {} does not match the {expected} bytes its header declares (file: {})",
                reader.len(),
                reader.path().display()
            )));
        }
        debug!(
            "opened {} with {} {} events",
            reader.path().display(),
            header.event_count,
            header.event_type
        );
        Ok(Self { reader, header })
    }

    /// The validated file header.
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Representation of the stored events.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.header.event_type
    }

    /// Number of stored events.
    #[must_use]
    pub fn number_events(&self) -> u64 {
        self.header.event_count
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    /// Stored detector IDs, in file order.
    #[must_use]
    pub fn detector_ids(&self) -> Vec<DetectorId> {
        let data = &self.reader.as_bytes()[crate::HEADER_SIZE..self.header.edges_offset()];
        data.chunks_exact(4).map(read_i32).collect()
    }

    /// Stored bin edges.
    #[must_use]
    pub fn bin_edges(&self) -> Vec<f64> {
        let data =
            &self.reader.as_bytes()[self.header.edges_offset()..self.header.events_offset()];
        data.chunks_exact(8).map(read_f64).collect()
    }

    /// Decodes every stored event.
    #[must_use]
    pub fn read_events(&self) -> Events {
        let data = &self.reader.as_bytes()[self.header.events_offset()..];
        match self.header.event_type {
            EventType::Tof => Events::Tof(decode_records(data)),
            EventType::Weighted => Events::Weighted(decode_records(data)),
            EventType::WeightedNoTime => Events::WeightedNoTime(decode_records(data)),
        }
    }

    /// Reads the whole file into an unsorted [`EventList`].
    ///
    /// # Errors
    /// Returns [`Error::Core`] if the stored bin edges are not a valid
    /// histogram axis.
    pub fn read_list(&self) -> Result<EventList> {
        let edges = self.bin_edges();
        if !edges.is_empty() {
            rustevent_core::bins::validate_edges(&edges)?;
        }
        let mut list = EventList::from_events(self.read_events()).with_x(BinEdges::new(edges));
        list.add_detector_ids(self.detector_ids());
        Ok(list)
    }
}

fn decode_records<R: Record>(data: &[u8]) -> Vec<R> {
    if data.len() / R::SIZE < PARALLEL_DECODE_THRESHOLD {
        data.chunks_exact(R::SIZE).map(R::decode).collect()
    } else {
        data.par_chunks_exact(R::SIZE).map(R::decode).collect()
    }
}
