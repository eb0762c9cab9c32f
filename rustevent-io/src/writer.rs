//! File writers for event lists and histograms.

use crate::format::{FileHeader, Record};
use crate::{Error, Result};
use log::debug;
use rustevent_list::{EventList, Events, Histogram};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Events encoded per buffered write.
const CHUNK_EVENTS: usize = 64 * 1024;

/// Writer for event files and histogram exports.
pub struct EventFileWriter {
    writer: BufWriter<File>,
}

impl EventFileWriter {
    /// Creates a new file writer, truncating any existing file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes `list` in the binary event file format.
    ///
    /// Events are written in storage order; the sort state is not stored.
    ///
    /// # Errors
    /// Returns an error on I/O failure, or [`Error::InvalidFormat`] if the
    /// detector ID or bin edge count does not fit the header.
    pub fn write_event_list(&mut self, list: &EventList) -> Result<()> {
        let header = FileHeader {
            event_type: list.event_type(),
            detector_count: count_u32(list.detector_ids().len(), "detector IDs")?,
            edge_count: count_u32(list.data_x().len(), "bin edges")?,
            event_count: list.number_events() as u64,
        };
        self.writer.write_all(&header.to_bytes())?;
        for id in list.detector_ids() {
            self.writer.write_all(&id.to_le_bytes())?;
        }
        for edge in list.data_x() {
            self.writer.write_all(&edge.to_le_bytes())?;
        }

        match &*list.events() {
            Events::Tof(v) => self.write_records(v)?,
            Events::Weighted(v) => self.write_records(v)?,
            Events::WeightedNoTime(v) => self.write_records(v)?,
        }
        debug!(
            "wrote {} {} events, {} detector IDs",
            header.event_count, header.event_type, header.detector_count
        );

        self.writer.flush()?;
        Ok(())
    }

    fn write_records<R: Record>(&mut self, events: &[R]) -> Result<()> {
        let mut buffer = Vec::with_capacity(CHUNK_EVENTS.min(events.len()) * R::SIZE);
        for chunk in events.chunks(CHUNK_EVENTS) {
            buffer.clear();
            for event in chunk {
                event.encode(&mut buffer);
            }
            self.writer.write_all(&buffer)?;
        }
        Ok(())
    }

    /// Writes a histogram as CSV with one `bin_low,bin_high,count,error`
    /// row per bin. The error column is empty when errors were skipped.
    ///
    /// # Errors
    /// Returns an error on I/O failure, or [`Error::InvalidFormat`] if
    /// `edges` does not have one more value than the histogram has bins.
    pub fn write_histogram_csv(&mut self, edges: &[f64], histogram: &Histogram) -> Result<()> {
        if edges.len() != histogram.len() + 1 {
            return Err(Error::InvalidFormat(format!(
                "{} bin edges for {} bins",
                edges.len(),
                histogram.len()
            )));
        }
        writeln!(self.writer, "bin_low,bin_high,count,error")?;

        for (i, count) in histogram.counts.iter().enumerate() {
            match histogram.errors.get(i) {
                Some(error) => writeln!(
                    self.writer,
                    "{},{},{},{}",
                    edges[i],
                    edges[i + 1],
                    count,
                    error
                )?,
                None => writeln!(self.writer, "{},{},{},", edges[i], edges[i + 1], count)?,
            }
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn count_u32(count: usize, what: &str) -> Result<u32> {
    u32::try_from(count)
        .map_err(|_| Error::InvalidFormat(format!("too many {what} for the header: {count}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustevent_list::{BinEdges, TofEvent, WeightedEvent};
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_histogram_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = EventFileWriter::create(file.path()).unwrap();

        let histogram = Histogram {
            counts: vec![1.0, 4.0],
            errors: vec![1.0, 2.0],
        };
        writer
            .write_histogram_csv(&[0.0, 0.5, 1.0], &histogram)
            .unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("bin_low,bin_high,count,error\n"));
        assert!(content.contains("0,0.5,1,1\n"));
        assert!(content.contains("0.5,1,4,2\n"));
    }

    #[test]
    fn test_write_histogram_csv_without_errors() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = EventFileWriter::create(file.path()).unwrap();
        let histogram = Histogram {
            counts: vec![3.0],
            errors: Vec::new(),
        };
        writer.write_histogram_csv(&[1.0, 2.0], &histogram).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("1,2,3,\n"));
        assert!(writer.write_histogram_csv(&[1.0], &histogram).is_err());
    }

    #[test]
    fn test_write_event_list_size() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = EventFileWriter::create(file.path()).unwrap();

        let mut list = EventList::new()
            .with_detector_id(1)
            .with_x(BinEdges::new(vec![0.0, 1.0, 2.0]));
        list.push_tof(TofEvent::new(1.0, 10));
        list.push_weighted(WeightedEvent::new(2.0, 20, 0.5, 0.25));
        writer.write_event_list(&list).unwrap();

        let data = std::fs::read(file.path()).unwrap();
        // header + 1 id + 3 edges + 2 weighted events
        assert_eq!(data.len(), 24 + 4 + 3 * 8 + 2 * 32);
    }
}
