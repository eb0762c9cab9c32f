//! Histogram synthesis, integration and column extraction.

use rustevent_algorithms::histogram::integrate;
use rustevent_algorithms::{Histogram, SortConfig};
use rustevent_core::bins::validate_edges;
use rustevent_core::{Event, PulseTime, Result, SortOrder, TimedEvent};

use crate::event_list::{no_pulse_time, EventList, Events};

fn column<E: Event>(events: &[E], f: impl Fn(&E) -> f64) -> Vec<f64> {
    events.iter().map(f).collect()
}

fn tof_extreme<E: Event>(events: &[E], sorted: bool, max: bool) -> Option<f64> {
    if sorted {
        let event = if max { events.last() } else { events.first() };
        return event.map(Event::tof);
    }
    let tofs = events.iter().map(Event::tof);
    if max {
        tofs.reduce(f64::max)
    } else {
        tofs.reduce(f64::min)
    }
}

fn pulse_extreme<E: TimedEvent>(events: &[E], sorted: bool, max: bool) -> Option<PulseTime> {
    if sorted {
        let event = if max { events.last() } else { events.first() };
        return event.map(TimedEvent::pulse_time);
    }
    let times = events.iter().map(TimedEvent::pulse_time);
    if max {
        times.max()
    } else {
        times.min()
    }
}

impl EventList {
    /// Bins the events into `x`, sorting by TOF first if needed.
    ///
    /// Plain events give counts with `sqrt(count)` errors; weighted events
    /// give summed weights with `sqrt(sum e2)` errors. With `skip_errors`
    /// the returned errors are empty.
    ///
    /// # Errors
    /// Returns [`rustevent_core::Error::InvalidArgument`] if `x` has fewer
    /// than two values or is not strictly increasing. Nothing is sorted in
    /// that case.
    pub fn generate_histogram(&self, x: &[f64], skip_errors: bool) -> Result<Histogram> {
        self.generate_histogram_with(x, skip_errors, &SortConfig::default())
    }

    /// [`EventList::generate_histogram`] with an explicit sort configuration.
    ///
    /// # Errors
    /// See [`EventList::generate_histogram`].
    pub fn generate_histogram_with(
        &self,
        x: &[f64],
        skip_errors: bool,
        config: &SortConfig,
    ) -> Result<Histogram> {
        validate_edges(x)?;
        self.sort_tof_with(config);
        let events = self.events.borrow();
        with_events!(&*events, v => Histogram::from_sorted(v, x, skip_errors))
    }

    /// Bins the events into the list's own bin edges.
    ///
    /// # Errors
    /// See [`EventList::generate_histogram`].
    pub fn histogram(&self, skip_errors: bool) -> Result<Histogram> {
        self.generate_histogram(self.x.as_slice(), skip_errors)
    }

    /// Sums weights in `[min, max)` and returns `(sum, error)`.
    ///
    /// With `entire_range` every event counts and no sort is needed.
    pub fn integrate(&self, min: f64, max: f64, entire_range: bool) -> (f64, f64) {
        if !entire_range {
            self.sort_tof();
        }
        let events = self.events.borrow();
        with_events!(&*events, v => integrate(v, min, max, entire_range))
    }

    /// Smallest TOF, or `None` for an empty list.
    #[must_use]
    pub fn tof_min(&self) -> Option<f64> {
        let sorted = self.order.get() == SortOrder::Tof;
        let events = self.events.borrow();
        with_events!(&*events, v => tof_extreme(v, sorted, false))
    }

    /// Largest TOF, or `None` for an empty list.
    #[must_use]
    pub fn tof_max(&self) -> Option<f64> {
        let sorted = self.order.get() == SortOrder::Tof;
        let events = self.events.borrow();
        with_events!(&*events, v => tof_extreme(v, sorted, true))
    }

    /// Earliest pulse time, or `None` for an empty list.
    ///
    /// # Errors
    /// Returns [`rustevent_core::Error::InvalidState`] for weighted-no-time lists.
    pub fn pulse_time_min(&self) -> Result<Option<PulseTime>> {
        self.pulse_time_extreme(false)
    }

    /// Latest pulse time, or `None` for an empty list.
    ///
    /// # Errors
    /// Returns [`rustevent_core::Error::InvalidState`] for weighted-no-time lists.
    pub fn pulse_time_max(&self) -> Result<Option<PulseTime>> {
        self.pulse_time_extreme(true)
    }

    fn pulse_time_extreme(&self, max: bool) -> Result<Option<PulseTime>> {
        let sorted = self.order.get() == SortOrder::PulseTime;
        match &*self.events.borrow() {
            Events::Tof(v) => Ok(pulse_extreme(v, sorted, max)),
            Events::Weighted(v) => Ok(pulse_extreme(v, sorted, max)),
            Events::WeightedNoTime(_) => Err(no_pulse_time("read pulse times")),
        }
    }

    /// Time-of-flight of every event, in storage order.
    #[must_use]
    pub fn tofs(&self) -> Vec<f64> {
        let events = self.events.borrow();
        with_events!(&*events, v => column(v, Event::tof))
    }

    /// Weight of every event (1 for plain events).
    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        let events = self.events.borrow();
        with_events!(&*events, v => column(v, Event::weight))
    }

    /// Squared uncertainty of every event (1 for plain events).
    #[must_use]
    pub fn error_squareds(&self) -> Vec<f64> {
        let events = self.events.borrow();
        with_events!(&*events, v => column(v, Event::error_squared))
    }

    /// Pulse time of every event, in storage order.
    ///
    /// # Errors
    /// Returns [`rustevent_core::Error::InvalidState`] for weighted-no-time lists.
    pub fn pulse_times(&self) -> Result<Vec<PulseTime>> {
        match &*self.events.borrow() {
            Events::Tof(v) => Ok(v.iter().map(TimedEvent::pulse_time).collect()),
            Events::Weighted(v) => Ok(v.iter().map(TimedEvent::pulse_time).collect()),
            Events::WeightedNoTime(_) => Err(no_pulse_time("read pulse times")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustevent_core::{BinEdges, Error, TofEvent, WeightedEvent, WeightedEventNoTime};

    fn plain(tofs: &[f64]) -> EventList {
        EventList::from_events(Events::Tof(
            tofs.iter().map(|&t| TofEvent::new(t, 0)).collect(),
        ))
    }

    #[test]
    fn test_histogram_sorts_lazily() {
        let list = plain(&[20.0, 10.0, 15.0]);
        let hist = list.generate_histogram(&[0.0, 12.0, 25.0], false).unwrap();
        assert_eq!(hist.counts, vec![1.0, 2.0]);
        assert!(list.is_sorted_by_tof());
    }

    #[test]
    fn test_bad_edges_leave_list_unsorted() {
        let list = plain(&[2.0, 1.0]);
        assert!(matches!(
            list.generate_histogram(&[1.0, 1.0], false),
            Err(Error::InvalidArgument(_))
        ));
        assert!(list.generate_histogram(&[0.0], false).is_err());
        assert_eq!(list.sort_order(), SortOrder::Unsorted);
    }

    #[test]
    fn test_histogram_uses_own_edges() {
        let list = plain(&[0.5, 1.5, 1.6]).with_x(BinEdges::new(vec![0.0, 1.0, 2.0]));
        let hist = list.histogram(true).unwrap();
        assert_eq!(hist.counts, vec![1.0, 2.0]);
        assert!(hist.errors.is_empty());
        assert!(plain(&[1.0]).histogram(false).is_err());
    }

    #[test]
    fn test_promotion_keeps_counts_and_drops_errors() {
        let mut list = plain(&[1.0, 2.0, 2.5, 7.0]);
        let edges = [0.0, 2.0, 5.0, 10.0];
        let before = list.generate_histogram(&edges, false).unwrap();
        assert_relative_eq!(before.errors[1], 2.0_f64.sqrt());
        list.switch_to(rustevent_core::EventType::Weighted).unwrap();
        let after = list.generate_histogram(&edges, false).unwrap();
        assert_eq!(before.counts, after.counts);
        assert_eq!(after.errors, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_nan_tof_dropped_from_histogram() {
        let list = plain(&[f64::NAN, 1.0, 6.0, -f64::NAN]);
        let hist = list.generate_histogram(&[0.0, 5.0, 10.0], false).unwrap();
        assert_eq!(hist.counts, vec![1.0, 1.0]);
        assert_eq!(list.number_events(), 4);
    }

    #[test]
    fn test_integrate() {
        let list = EventList::from_events(Events::Weighted(vec![
            WeightedEvent::new(3.0, 0, 2.0, 4.0),
            WeightedEvent::new(1.0, 0, 1.0, 5.0),
        ]));
        let (sum, err) = list.integrate(0.0, 2.0, false);
        assert_relative_eq!(sum, 1.0);
        assert_relative_eq!(err, 5.0_f64.sqrt());
        let (sum, err) = list.integrate(0.0, 0.0, true);
        assert_relative_eq!(sum, 3.0);
        assert_relative_eq!(err, 3.0);
    }

    #[test]
    fn test_extremes() {
        let list = EventList::from_events(Events::Tof(vec![
            TofEvent::new(5.0, 30),
            TofEvent::new(1.0, 10),
            TofEvent::new(9.0, 20),
        ]));
        assert_eq!(list.tof_min(), Some(1.0));
        assert_eq!(list.tof_max(), Some(9.0));
        list.sort_tof();
        assert_eq!(list.tof_min(), Some(1.0));
        assert_eq!(list.tof_max(), Some(9.0));
        assert_eq!(list.pulse_time_min().unwrap(), Some(PulseTime(10)));
        assert_eq!(list.pulse_time_max().unwrap(), Some(PulseTime(30)));
        assert_eq!(EventList::new().tof_min(), None);
    }

    #[test]
    fn test_columns() {
        let list = EventList::from_events(Events::Weighted(vec![
            WeightedEvent::new(1.0, 7, 2.0, 3.0),
            WeightedEvent::new(2.0, 8, 4.0, 5.0),
        ]));
        assert_eq!(list.tofs(), vec![1.0, 2.0]);
        assert_eq!(list.weights(), vec![2.0, 4.0]);
        assert_eq!(list.error_squareds(), vec![3.0, 5.0]);
        assert_eq!(list.pulse_times().unwrap(), vec![PulseTime(7), PulseTime(8)]);

        let no_time = EventList::from_events(Events::WeightedNoTime(vec![
            WeightedEventNoTime::new(1.0, 1.0, 1.0),
        ]));
        assert!(no_time.pulse_times().is_err());
        assert!(no_time.pulse_time_min().is_err());
        assert_eq!(plain(&[3.0]).weights(), vec![1.0]);
    }
}
