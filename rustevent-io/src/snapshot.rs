//! JSON snapshots of event lists.

use crate::Result;
use rustevent_list::{BinEdges, DetectorId, EventList, Events};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Serializable copy of an [`EventList`].
///
/// `events` is tagged by representation, e.g. `{"tof": [...]}`. The sort
/// state is not part of the snapshot; a restored list starts unsorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventListSnapshot {
    /// Detector IDs in ascending order.
    pub detector_ids: Vec<DetectorId>,
    /// Bin edges; empty when the list has none.
    #[serde(default)]
    pub bin_edges: Vec<f64>,
    /// The events, in storage order.
    pub events: Events,
}

impl From<&EventList> for EventListSnapshot {
    fn from(list: &EventList) -> Self {
        Self {
            detector_ids: list.detector_ids().iter().copied().collect(),
            bin_edges: list.data_x().to_vec(),
            events: list.events().clone(),
        }
    }
}

impl EventListSnapshot {
    /// Rebuilds the event list.
    ///
    /// # Errors
    /// Returns [`crate::Error::Core`] if non-empty bin edges are not
    /// strictly increasing.
    pub fn into_event_list(self) -> Result<EventList> {
        if !self.bin_edges.is_empty() {
            rustevent_core::bins::validate_edges(&self.bin_edges)?;
        }
        let mut list = EventList::from_events(self.events).with_x(BinEdges::new(self.bin_edges));
        list.add_detector_ids(self.detector_ids);
        Ok(list)
    }

    /// Encodes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes a snapshot from JSON text.
    ///
    /// # Errors
    /// Returns an error if the text is not a valid snapshot.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Writes the snapshot to a JSON file.
    ///
    /// # Errors
    /// Returns an error on I/O or serialization failure.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a snapshot from a JSON file.
    ///
    /// # Errors
    /// Returns an error on I/O failure or if the file is not a valid snapshot.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
