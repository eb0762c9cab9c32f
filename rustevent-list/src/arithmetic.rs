//! Scalar and histogram arithmetic on weights, and TOF/pulse-time shifts.

use rustevent_algorithms::scaling::{check_histogram_inputs, scale_by_histogram, BinOperation};
use rustevent_core::{Error, Event, EventType, Result, SortOrder, TimedEvent, WeightedMut};

use crate::event_list::{no_pulse_time, EventList, Events};

fn scale_all<E: WeightedMut>(events: &mut [E], value: f64, error: f64) {
    for event in events {
        event.scale(value, error);
    }
}

fn convert_all<E: Event>(events: &mut [E], factor: f64, offset: f64) {
    for event in events {
        event.convert_tof(factor, offset);
    }
}

fn shift_pulse_times<E: TimedEvent>(events: &mut [E], offset_ns: i64) {
    for event in events {
        event.set_pulse_time(event.pulse_time().offset(offset_ns));
    }
}

impl EventList {
    /// Multiplies every weight by `value` with uncertainty `error`.
    ///
    /// `w' = w * value`, `e2' = e2 * value² + error² * w²`. A plain list is
    /// promoted to weighted first. Multiplying by exactly `(1.0, 0.0)` does
    /// nothing at all.
    #[allow(clippy::float_cmp)]
    pub fn multiply(&mut self, value: f64, error: f64) {
        if value == 1.0 && error == 0.0 {
            return;
        }
        self.promote_at_least(EventType::Weighted);
        match self.events.get_mut() {
            Events::Weighted(v) => scale_all(v, value, error),
            Events::WeightedNoTime(v) => scale_all(v, value, error),
            Events::Tof(_) => unreachable!("promoted to at least weighted"),
        }
        self.order.set(SortOrder::Unsorted);
    }

    /// Divides every weight by `value` with uncertainty `error`.
    ///
    /// # Errors
    /// Returns [`Error::DivideByZero`] if `value` is exactly zero; the list
    /// is left unchanged.
    #[allow(clippy::float_cmp)]
    pub fn divide(&mut self, value: f64, error: f64) -> Result<()> {
        if value == 0.0 {
            return Err(Error::DivideByZero);
        }
        self.multiply(1.0 / value, error / (value * value));
        Ok(())
    }

    /// Multiplies each event by the value of the histogram bin holding its TOF.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] unless `x.len() == y.len() + 1` and
    /// `e.len() == y.len()`.
    pub fn multiply_histogram(&mut self, x: &[f64], y: &[f64], e: &[f64]) -> Result<()> {
        self.scale_histogram(x, y, e, BinOperation::Multiply)
    }

    /// Divides each event by the value of the histogram bin holding its TOF.
    ///
    /// Events in a zero-valued bin get a NaN weight and zero error.
    ///
    /// # Errors
    /// Same as [`EventList::multiply_histogram`].
    pub fn divide_histogram(&mut self, x: &[f64], y: &[f64], e: &[f64]) -> Result<()> {
        self.scale_histogram(x, y, e, BinOperation::Divide)
    }

    fn scale_histogram(
        &mut self,
        x: &[f64],
        y: &[f64],
        e: &[f64],
        operation: BinOperation,
    ) -> Result<()> {
        check_histogram_inputs(x, y, e)?;
        if self.events.get_mut().is_empty() {
            return Ok(());
        }
        self.promote_at_least(EventType::Weighted);
        self.sort_tof();
        match self.events.get_mut() {
            Events::Weighted(v) => scale_by_histogram(v, x, y, e, operation),
            Events::WeightedNoTime(v) => scale_by_histogram(v, x, y, e, operation),
            Events::Tof(_) => unreachable!("promoted to at least weighted"),
        }
        self.order.set(SortOrder::Unsorted);
        Ok(())
    }

    /// Applies `tof * factor + offset` to every event and to the bin edges.
    ///
    /// A negative factor reverses the axis: the bin edges are reversed so
    /// they stay ascending, and a TOF-sorted list is reversed so it stays
    /// TOF-sorted.
    pub fn convert_tof(&mut self, factor: f64, offset: f64) {
        with_events!(self.events.get_mut(), v => convert_all(v, factor, offset));
        if !self.x.is_empty() {
            for edge in self.x.make_mut().iter_mut() {
                *edge = *edge * factor + offset;
            }
        }

        if factor < 0.0 {
            if !self.x.is_empty() {
                self.x.make_mut().reverse();
            }
            if self.order.get() == SortOrder::Tof {
                with_events!(self.events.get_mut(), v => v.reverse());
            } else {
                self.order.set(SortOrder::Unsorted);
            }
        } else {
            self.order.set(SortOrder::Unsorted);
        }
    }

    /// Adds `offset` to every TOF and bin edge.
    pub fn add_tof(&mut self, offset: f64) {
        self.convert_tof(1.0, offset);
    }

    /// Multiplies every TOF and bin edge by `factor`.
    pub fn scale_tof(&mut self, factor: f64) {
        self.convert_tof(factor, 0.0);
    }

    /// Shifts every pulse time by `offset_ns` nanoseconds.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] for weighted-no-time lists.
    pub fn add_pulse_time(&mut self, offset_ns: i64) -> Result<()> {
        match self.events.get_mut() {
            Events::Tof(v) => shift_pulse_times(v, offset_ns),
            Events::Weighted(v) => shift_pulse_times(v, offset_ns),
            Events::WeightedNoTime(_) => return Err(no_pulse_time("shift pulse times")),
        }
        self.order.set(SortOrder::Unsorted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustevent_core::{BinEdges, TofEvent, WeightedEvent, WeightedEventNoTime};

    fn weighted(pairs: &[(f64, f64, f64)]) -> EventList {
        EventList::from_events(Events::Weighted(
            pairs
                .iter()
                .map(|&(tof, w, e2)| WeightedEvent::new(tof, 0, w, e2))
                .collect(),
        ))
    }

    #[test]
    fn test_multiply_identity_is_free() {
        let mut list = EventList::from_events(Events::Tof(vec![TofEvent::new(1.0, 0)]));
        list.sort_tof();
        list.multiply(1.0, 0.0);
        assert_eq!(list.event_type(), EventType::Tof);
        assert!(list.is_sorted_by_tof());
    }

    #[test]
    fn test_multiply_plain_promotes() {
        let mut list = EventList::from_events(Events::Tof(vec![TofEvent::new(1.0, 0)]));
        list.multiply(3.0, 0.5);
        let events = list.weighted_events().unwrap();
        assert_relative_eq!(events[0].weight, 3.0);
        // 0 * 9 + 0.25 * 1
        assert_relative_eq!(events[0].error_squared, 0.25);
    }

    #[test]
    fn test_divide() {
        let mut list = weighted(&[(1.0, 4.0, 4.0)]);
        list.divide(2.0, 0.0).unwrap();
        let events = list.weighted_events().unwrap();
        assert_relative_eq!(events[0].weight, 2.0);
        assert_relative_eq!(events[0].error_squared, 1.0);
    }

    #[test]
    fn test_divide_no_time_list() {
        let mut list = EventList::from_events(Events::WeightedNoTime(vec![
            WeightedEventNoTime::new(1.0, 6.0, 9.0),
        ]));
        list.divide(3.0, 0.0).unwrap();
        let events = list.weighted_no_time_events().unwrap();
        assert_relative_eq!(events[0].weight, 2.0);
        assert_relative_eq!(events[0].error_squared, 1.0);
    }

    #[test]
    fn test_histogram_multiply_rejects_bad_shapes() {
        let mut list = EventList::from_events(Events::Tof(vec![TofEvent::new(1.0, 0)]));
        let err = list.multiply_histogram(&[0.0, 1.0], &[1.0, 2.0], &[0.0, 0.0]);
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
        assert_eq!(list.event_type(), EventType::Tof);
    }

    #[test]
    fn test_histogram_multiply_matches_bins() {
        let mut list = EventList::from_events(Events::Tof(vec![
            TofEvent::new(2.5, 0),
            TofEvent::new(0.5, 0),
            TofEvent::new(1.5, 0),
            TofEvent::new(10.0, 0),
        ]));
        list.multiply_histogram(&[1.0, 2.0, 3.0], &[2.0, 4.0], &[0.0, 0.0])
            .unwrap();
        assert_eq!(list.sort_order(), SortOrder::Unsorted);
        let events = list.weighted_events().unwrap();
        let weights: Vec<f64> = events.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![1.0, 2.0, 4.0, 1.0]);
    }

    #[test]
    fn test_histogram_divide_by_zero_bin() {
        let mut list = weighted(&[(0.5, 2.0, 1.0), (1.5, 2.0, 1.0)]);
        list.divide_histogram(&[0.0, 1.0, 2.0], &[0.0, 2.0], &[0.0, 0.0])
            .unwrap();
        let events = list.weighted_events().unwrap();
        assert!(events[0].weight.is_nan());
        assert_relative_eq!(events[0].error_squared, 0.0);
        assert_relative_eq!(events[1].weight, 1.0);
    }

    #[test]
    fn test_convert_tof_negative_factor_keeps_order() {
        let mut list = EventList::from_events(Events::Tof(vec![
            TofEvent::new(3.0, 0),
            TofEvent::new(1.0, 0),
            TofEvent::new(2.0, 0),
        ]))
        .with_x(BinEdges::new(vec![0.0, 2.0, 4.0]));
        list.sort_tof();
        list.convert_tof(-1.0, 10.0);
        assert!(list.is_sorted_by_tof());
        let tofs: Vec<f64> = list.tof_events().unwrap().iter().map(|e| e.tof).collect();
        assert_eq!(tofs, vec![7.0, 8.0, 9.0]);
        assert_eq!(list.data_x(), &[6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_convert_tof_negative_factor_on_unsorted_list() {
        let mut list = EventList::from_events(Events::Tof(vec![
            TofEvent::new(3.0, 0),
            TofEvent::new(1.0, 0),
            TofEvent::new(2.0, 0),
        ]));
        list.convert_tof(-1.0, 10.0);
        assert_eq!(list.sort_order(), SortOrder::Unsorted);
        // Mapped in place, not reversed.
        let tofs: Vec<f64> = list.tof_events().unwrap().iter().map(|e| e.tof).collect();
        assert_eq!(tofs, vec![7.0, 9.0, 8.0]);
    }

    #[test]
    fn test_convert_tof_positive_factor_unsorts() {
        let mut list = weighted(&[(1.0, 1.0, 1.0), (2.0, 1.0, 1.0)]);
        list.sort_tof();
        list.scale_tof(2.0);
        assert_eq!(list.sort_order(), SortOrder::Unsorted);
        list.add_tof(1.0);
        let tofs: Vec<f64> = list.weighted_events().unwrap().iter().map(|e| e.tof).collect();
        assert_eq!(tofs, vec![3.0, 5.0]);
    }

    #[test]
    fn test_convert_tof_does_not_touch_shared_edges() {
        let shared = BinEdges::new(vec![0.0, 1.0]);
        let other = EventList::new().with_x(shared.clone());
        let mut list = EventList::new().with_x(shared);
        list.add_tof(5.0);
        assert_eq!(list.data_x(), &[5.0, 6.0]);
        assert_eq!(other.data_x(), &[0.0, 1.0]);
    }

    #[test]
    fn test_add_pulse_time() {
        let mut list = EventList::from_events(Events::Tof(vec![TofEvent::new(1.0, 100)]));
        list.add_pulse_time(-40).unwrap();
        assert_eq!(list.tof_events().unwrap()[0].pulse_time.0, 60);

        let mut list = EventList::with_event_type(EventType::WeightedNoTime);
        assert!(matches!(list.add_pulse_time(1), Err(Error::InvalidState(_))));
    }
}
