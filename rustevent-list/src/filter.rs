//! Removing, compressing, filtering and splitting events.

use log::debug;
use rustevent_algorithms::compress::compress_events;
use rustevent_algorithms::histogram::{lower_bound_tof, upper_bound_tof};
use rustevent_algorithms::interval::{interval_slices, pulse_time_range, retain_in_intervals};
use rustevent_core::{Error, PulseTime, Result, SortOrder, TimeSplitter, WeightedEventNoTime};

use crate::event_list::{no_pulse_time, EventList, Events};

fn check_tolerance(tolerance: f64) -> Result<()> {
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(Error::invalid_argument(format!(
            "compression tolerance must be non-negative, got {tolerance}"
        )));
    }
    Ok(())
}

fn retain_masked<E>(events: &mut Vec<E>, keep: &[bool]) {
    let mut flags = keep.iter();
    events.retain(|_| flags.next().copied().unwrap_or(false));
}

impl EventList {
    /// Removes every event with `min <= tof <= max` and returns how many.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `max <= min`.
    pub fn mask_tof(&mut self, min: f64, max: f64) -> Result<usize> {
        if max <= min {
            return Err(Error::invalid_argument(format!(
                "mask range is empty: [{min}, {max}]"
            )));
        }
        if self.events.get_mut().is_empty() {
            return Ok(0);
        }
        self.sort_tof();
        let removed = with_events!(self.events.get_mut(), v => {
            let low = lower_bound_tof(v, min);
            let high = upper_bound_tof(v, max).max(low);
            v.drain(low..high).count()
        });
        self.order.set(SortOrder::Unsorted);
        Ok(removed)
    }

    /// Keeps the events whose entry in `keep` is true and returns how many
    /// were removed.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `keep.len()` differs from the
    /// number of events.
    pub fn retain_by_mask(&mut self, keep: &[bool]) -> Result<usize> {
        let events = self.events.get_mut();
        let before = events.len();
        if keep.len() != before {
            return Err(Error::invalid_argument(format!(
                "mask has {} entries for {before} events",
                keep.len()
            )));
        }
        with_events!(events, v => retain_masked(v, keep));
        let removed = before - events.len();
        self.order.set(SortOrder::Unsorted);
        Ok(removed)
    }

    /// Merges events closer than `tolerance` in TOF, in place.
    ///
    /// The list always becomes weighted-no-time and TOF-sorted.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for a negative or NaN tolerance.
    pub fn compress_in_place(&mut self, tolerance: f64) -> Result<()> {
        check_tolerance(tolerance)?;
        self.sort_tof();
        let mut out = Vec::new();
        with_events!(self.events.get_mut(), v => compress_events(v, tolerance, &mut out));
        *self.events.get_mut() = Events::WeightedNoTime(out);
        self.order.set(SortOrder::Tof);
        Ok(())
    }

    /// Writes the compressed events into `dest`, leaving this list's events
    /// unchanged apart from sorting.
    ///
    /// `dest` takes this list's detector IDs and bin edges and ends up
    /// weighted-no-time and TOF-sorted.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for a negative or NaN tolerance.
    pub fn compress_into(&self, tolerance: f64, dest: &mut EventList) -> Result<()> {
        check_tolerance(tolerance)?;
        self.sort_tof();
        let mut out = match std::mem::take(dest.events.get_mut()) {
            Events::WeightedNoTime(v) => v,
            _ => Vec::<WeightedEventNoTime>::new(),
        };
        let events = self.events.borrow();
        with_events!(&*events, v => compress_events(v, tolerance, &mut out));
        *dest.events.get_mut() = Events::WeightedNoTime(out);
        dest.order.set(SortOrder::Tof);
        dest.detector_ids.clone_from(&self.detector_ids);
        dest.x = self.x.clone();
        Ok(())
    }

    /// Copies events with `start <= pulse time < stop` into `output`.
    ///
    /// `output` is replaced: it takes this list's event type, detector IDs
    /// and bin edges, and is left pulse-time-sorted.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] for weighted-no-time lists.
    pub fn filter_by_pulse_time(
        &self,
        start: PulseTime,
        stop: PulseTime,
        output: &mut EventList,
    ) -> Result<()> {
        self.sort_pulse_time()?;
        let events = self.events.borrow();
        *output.events.get_mut() = match &*events {
            Events::Tof(v) => Events::Tof(pulse_time_range(v, start, stop).to_vec()),
            Events::Weighted(v) => Events::Weighted(pulse_time_range(v, start, stop).to_vec()),
            Events::WeightedNoTime(_) => return Err(no_pulse_time("filter by pulse time")),
        };
        output.order.set(SortOrder::PulseTime);
        output.detector_ids.clone_from(&self.detector_ids);
        output.x = self.x.clone();
        Ok(())
    }

    /// Keeps only events inside intervals with a non-negative index.
    ///
    /// The list is left pulse-time-sorted.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] for weighted-no-time lists.
    pub fn filter_in_place(&mut self, splitter: &TimeSplitter) -> Result<()> {
        self.sort_pulse_time()?;
        match self.events.get_mut() {
            Events::Tof(v) => retain_in_intervals(v, splitter),
            Events::Weighted(v) => retain_in_intervals(v, splitter),
            Events::WeightedNoTime(_) => return Err(no_pulse_time("filter by pulse time")),
        }
        Ok(())
    }

    /// Copies the events of each interval into `outputs[index]`.
    ///
    /// Every output is cleared, switched to this list's event type and given
    /// its detector IDs and bin edges, then left pulse-time-sorted. Intervals
    /// whose index is negative or past the end of `outputs` are skipped.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] for weighted-no-time lists.
    pub fn split_by_time(&self, splitter: &TimeSplitter, outputs: &mut [EventList]) -> Result<()> {
        self.sort_pulse_time()?;
        let event_type = self.event_type();
        for output in outputs.iter_mut() {
            output.reset_to(event_type);
            output.order.set(SortOrder::PulseTime);
            output.detector_ids.clone_from(&self.detector_ids);
            output.x = self.x.clone();
        }

        let events = self.events.borrow();
        match &*events {
            Events::Tof(v) => {
                for (index, slice) in interval_slices(v, splitter) {
                    if let Some(Events::Tof(out)) = target(outputs, index) {
                        out.extend_from_slice(slice);
                    }
                }
            }
            Events::Weighted(v) => {
                for (index, slice) in interval_slices(v, splitter) {
                    if let Some(Events::Weighted(out)) = target(outputs, index) {
                        out.extend_from_slice(slice);
                    }
                }
            }
            Events::WeightedNoTime(_) => return Err(no_pulse_time("split by pulse time")),
        }
        Ok(())
    }
}

fn target(outputs: &mut [EventList], index: i32) -> Option<&mut Events> {
    let slot = usize::try_from(index).ok().filter(|&i| i < outputs.len());
    if slot.is_none() && index >= 0 {
        debug!(
            "split interval index {index} has no output (only {} outputs), skipping",
            outputs.len()
        );
    }
    slot.map(|i| outputs[i].events.get_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustevent_core::{BinEdges, EventType, SplittingInterval, TofEvent, WeightedEvent};

    fn plain(pairs: &[(f64, i64)]) -> EventList {
        EventList::from_events(Events::Tof(
            pairs.iter().map(|&(t, p)| TofEvent::new(t, p)).collect(),
        ))
    }

    fn at_times(times: &[i64]) -> EventList {
        plain(&times.iter().map(|&t| (1.0, t)).collect::<Vec<_>>())
    }

    fn times(list: &EventList) -> Vec<i64> {
        list.pulse_times().unwrap().iter().map(|t| t.0).collect()
    }

    #[test]
    fn test_mask_tof_is_inclusive() {
        let mut list = plain(&[(5.0, 0), (1.0, 0), (2.0, 0), (3.0, 0), (4.0, 0)]);
        assert_eq!(list.mask_tof(2.0, 4.0).unwrap(), 3);
        assert_eq!(list.tofs(), vec![1.0, 5.0]);
        assert_eq!(list.sort_order(), SortOrder::Unsorted);
    }

    #[test]
    fn test_mask_tof_rejects_empty_range() {
        let mut list = plain(&[(1.0, 0)]);
        assert!(matches!(list.mask_tof(2.0, 2.0), Err(Error::InvalidArgument(_))));
        assert!(list.mask_tof(3.0, 2.0).is_err());
        assert_eq!(list.number_events(), 1);
    }

    #[test]
    fn test_retain_by_mask() {
        let mut list = plain(&[(1.0, 0), (2.0, 0), (3.0, 0)]);
        assert!(list.retain_by_mask(&[true]).is_err());
        assert_eq!(list.retain_by_mask(&[true, false, true]).unwrap(), 1);
        assert_eq!(list.tofs(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_compress_in_place() {
        let mut list = plain(&[(9.0, 0), (5.0, 0), (5.000_000_5, 0)]);
        list.compress_in_place(0.001).unwrap();
        assert_eq!(list.event_type(), EventType::WeightedNoTime);
        assert!(list.is_sorted_by_tof());
        let events = list.weighted_no_time_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_relative_eq!(events[0].weight, 2.0);
    }

    #[test]
    fn test_compress_rejects_bad_tolerance() {
        let mut list = plain(&[(1.0, 0)]);
        assert!(list.compress_in_place(-1.0).is_err());
        assert!(list.compress_in_place(f64::NAN).is_err());
        assert_eq!(list.event_type(), EventType::Tof);
    }

    #[test]
    fn test_compress_into_copies_metadata() {
        let list = plain(&[(1.0, 0), (1.1, 0), (3.0, 0)])
            .with_detector_id(12)
            .with_x(BinEdges::new(vec![0.0, 5.0]));
        let mut dest = plain(&[(100.0, 0)]).with_detector_id(99);
        list.compress_into(0.5, &mut dest).unwrap();
        assert_eq!(list.event_type(), EventType::Tof);
        assert_eq!(list.number_events(), 3);
        assert_eq!(dest.number_events(), 2);
        assert!(dest.has_detector_id(12) && !dest.has_detector_id(99));
        assert!(dest.x().ptr_eq(list.x()));
        assert!(dest.is_sorted_by_tof());
    }

    #[test]
    fn test_filter_by_pulse_time() {
        let list = at_times(&[400, 100, 300, 200]).with_detector_id(3);
        let mut out = EventList::with_event_type(EventType::WeightedNoTime);
        list.filter_by_pulse_time(PulseTime(150), PulseTime(350), &mut out)
            .unwrap();
        assert_eq!(out.event_type(), EventType::Tof);
        assert_eq!(times(&out), vec![200, 300]);
        assert_eq!(out.sort_order(), SortOrder::PulseTime);
        assert!(out.has_detector_id(3));

        list.filter_by_pulse_time(PulseTime(350), PulseTime(150), &mut out)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_filter_in_place_needs_pulse_times() {
        let mut list = EventList::with_event_type(EventType::WeightedNoTime);
        let splitter = TimeSplitter::single(0, 10, 0).unwrap();
        assert!(matches!(list.filter_in_place(&splitter), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_filter_by_pulse_time_needs_pulse_times() {
        let mut list = EventList::with_event_type(EventType::WeightedNoTime);
        list.push_tof(TofEvent::new(1.0, 200));
        let mut out = at_times(&[100, 300]).with_detector_id(5);
        let err = list.filter_by_pulse_time(PulseTime(0), PulseTime(1_000), &mut out);
        assert!(matches!(err, Err(Error::InvalidState(_))));
        assert_eq!(out.event_type(), EventType::Tof);
        assert_eq!(times(&out), vec![100, 300]);
        assert!(out.has_detector_id(5));
    }

    #[test]
    fn test_split_by_time_needs_pulse_times() {
        let mut list = EventList::with_event_type(EventType::WeightedNoTime);
        list.push_tof(TofEvent::new(1.0, 5));
        let splitter = TimeSplitter::single(0, 10, 0).unwrap();
        let mut outputs = vec![at_times(&[1, 2, 3]).with_detector_id(8)];
        let err = list.split_by_time(&splitter, &mut outputs);
        assert!(matches!(err, Err(Error::InvalidState(_))));
        assert_eq!(outputs[0].event_type(), EventType::Tof);
        assert_eq!(outputs[0].number_events(), 3);
        assert!(outputs[0].has_detector_id(8));
    }

    #[test]
    fn test_split_by_time() {
        let list = EventList::from_events(Events::Weighted(
            [5, 15, 25, 35, 45]
                .iter()
                .map(|&t| WeightedEvent::new(1.0, t, 2.0, 1.0))
                .collect(),
        ));
        let splitter = TimeSplitter::new(vec![
            SplittingInterval::new(0, 10, 1),
            SplittingInterval::new(10, 30, 0),
            SplittingInterval::new(30, 40, 7),
            SplittingInterval::new(40, 50, -1),
        ])
        .unwrap();
        let mut outputs = vec![at_times(&[1, 2, 3]), EventList::new()];
        list.split_by_time(&splitter, &mut outputs).unwrap();

        assert_eq!(outputs[0].event_type(), EventType::Weighted);
        assert_eq!(times(&outputs[0]), vec![15, 25]);
        assert_eq!(times(&outputs[1]), vec![5]);
        assert!(outputs.iter().all(|o| o.sort_order() == SortOrder::PulseTime));
        assert_eq!(list.number_events(), 5);
    }
}
