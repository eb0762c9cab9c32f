//! Appending, promotion, merge and subtraction.

use std::ops::{AddAssign, SubAssign};

use log::trace;
use rustevent_core::{
    Error, EventType, Result, SortOrder, TofEvent, WeightedEvent, WeightedEventNoTime, WeightedMut,
};

use crate::event_list::{EventList, Events};

/// Rebuilds `events` into a fresh vector so the old allocation is freed.
fn converted<S: Copy, T: From<S>>(events: &[S]) -> Vec<T> {
    let mut out = Vec::with_capacity(events.len());
    out.extend(events.iter().map(|&e| T::from(e)));
    out
}

impl EventList {
    /// Promotes the list to `target`.
    ///
    /// Allowed moves are `Tof → Weighted`, `Tof → WeightedNoTime` and
    /// `Weighted → WeightedNoTime`; switching to the current type does
    /// nothing. Event order, and so the sort state, is kept.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] for any move down the lattice: pulse
    /// times cannot be restored and weights cannot be dropped. The list is
    /// left unchanged.
    pub fn switch_to(&mut self, target: EventType) -> Result<()> {
        let current = self.events.get_mut().event_type();
        if target < current {
            return Err(Error::invalid_state(format!(
                "cannot switch {current} events to {target}"
            )));
        }
        self.promote_at_least(target);
        Ok(())
    }

    /// Promotes to `join(current, target)`. Never fails.
    pub(crate) fn promote_at_least(&mut self, target: EventType) {
        let events = self.events.get_mut();
        let current = events.event_type();
        let target = current.join(target);
        if target == current {
            return;
        }
        trace!("promoting {} events from {current} to {target}", events.len());
        *events = match (&*events, target) {
            (Events::Tof(v), EventType::Weighted) => Events::Weighted(converted(v)),
            (Events::Tof(v), EventType::WeightedNoTime) => Events::WeightedNoTime(converted(v)),
            (Events::Weighted(v), EventType::WeightedNoTime) => {
                Events::WeightedNoTime(converted(v))
            }
            _ => unreachable!("join never moves down the lattice"),
        };
    }

    /// Appends a plain event, converting it to the list's representation.
    pub fn push_tof(&mut self, event: TofEvent) {
        match self.events.get_mut() {
            Events::Tof(v) => v.push(event),
            Events::Weighted(v) => v.push(event.into()),
            Events::WeightedNoTime(v) => v.push(event.into()),
        }
        self.order.set(SortOrder::Unsorted);
    }

    /// Appends a weighted event, promoting a plain list first.
    pub fn push_weighted(&mut self, event: WeightedEvent) {
        self.promote_at_least(EventType::Weighted);
        match self.events.get_mut() {
            Events::Weighted(v) => v.push(event),
            Events::WeightedNoTime(v) => v.push(event.into()),
            Events::Tof(_) => unreachable!("promoted to at least weighted"),
        }
        self.order.set(SortOrder::Unsorted);
    }

    /// Appends a weighted event without pulse time, degrading the list.
    pub fn push_weighted_no_time(&mut self, event: WeightedEventNoTime) {
        self.promote_at_least(EventType::WeightedNoTime);
        if let Events::WeightedNoTime(v) = self.events.get_mut() {
            v.push(event);
        }
        self.order.set(SortOrder::Unsorted);
    }

    /// Appends every event of `other`, promoting to the join of both types.
    ///
    /// Detector IDs are unioned and the result is unsorted. Merging a list
    /// into itself is not possible through this signature; clone first.
    pub fn merge(&mut self, other: &EventList) {
        let source = other.events.borrow();
        self.promote_at_least(source.event_type());
        append_converted(self.events.get_mut(), &source, false);
        self.detector_ids.extend(other.detector_ids.iter().copied());
        self.order.set(SortOrder::Unsorted);
    }

    /// Appends every event of `other` with its weight negated.
    ///
    /// The list becomes at least weighted. Squared uncertainties are kept,
    /// so a plain event arrives as weight `-1`, error squared `1`.
    pub fn subtract(&mut self, other: &EventList) {
        let source = other.events.borrow();
        self.promote_at_least(source.event_type().join(EventType::Weighted));
        append_converted(self.events.get_mut(), &source, true);
        self.detector_ids.extend(other.detector_ids.iter().copied());
        self.order.set(SortOrder::Unsorted);
    }
}

/// Appends `source` to `dest`, which must already be at least as general.
fn append_converted(dest: &mut Events, source: &Events, negate: bool) {
    let start = dest.len();
    match (&mut *dest, source) {
        (Events::Tof(d), Events::Tof(s)) => d.extend_from_slice(s),
        (Events::Weighted(d), Events::Tof(s)) => {
            d.extend(s.iter().map(|&e| WeightedEvent::from(e)));
        }
        (Events::Weighted(d), Events::Weighted(s)) => d.extend_from_slice(s),
        (Events::WeightedNoTime(d), Events::Tof(s)) => {
            d.extend(s.iter().map(|&e| WeightedEventNoTime::from(e)));
        }
        (Events::WeightedNoTime(d), Events::Weighted(s)) => {
            d.extend(s.iter().map(|&e| WeightedEventNoTime::from(e)));
        }
        (Events::WeightedNoTime(d), Events::WeightedNoTime(s)) => d.extend_from_slice(s),
        _ => unreachable!("destination is promoted to the join before appending"),
    }
    if negate {
        match dest {
            Events::Weighted(d) => negate_weights(&mut d[start..]),
            Events::WeightedNoTime(d) => negate_weights(&mut d[start..]),
            Events::Tof(_) => unreachable!("subtraction promotes to at least weighted"),
        }
    }
}

fn negate_weights<E: WeightedMut>(events: &mut [E]) {
    for event in events {
        event.set_weight(-event.weight(), event.error_squared());
    }
}

impl AddAssign<&EventList> for EventList {
    fn add_assign(&mut self, rhs: &EventList) {
        self.merge(rhs);
    }
}

impl SubAssign<&EventList> for EventList {
    fn sub_assign(&mut self, rhs: &EventList) {
        self.subtract(rhs);
    }
}

impl AddAssign<TofEvent> for EventList {
    fn add_assign(&mut self, rhs: TofEvent) {
        self.push_tof(rhs);
    }
}

impl AddAssign<WeightedEvent> for EventList {
    fn add_assign(&mut self, rhs: WeightedEvent) {
        self.push_weighted(rhs);
    }
}

impl AddAssign<WeightedEventNoTime> for EventList {
    fn add_assign(&mut self, rhs: WeightedEventNoTime) {
        self.push_weighted_no_time(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plain(tofs: &[f64]) -> EventList {
        let mut list = EventList::new();
        for (i, &tof) in tofs.iter().enumerate() {
            list.push_tof(TofEvent::new(tof, i64::try_from(i).unwrap()));
        }
        list
    }

    #[test]
    fn test_push_sets_unsorted() {
        let mut list = plain(&[1.0, 2.0]);
        list.sort_tof();
        list.push_tof(TofEvent::new(0.5, 0));
        assert_eq!(list.sort_order(), SortOrder::Unsorted);
        assert_eq!(list.number_events(), 3);
    }

    #[test]
    fn test_push_weighted_promotes_plain_list() {
        let mut list = plain(&[1.0, 2.0]);
        list += WeightedEvent::new(3.0, 5, 2.0, 0.5);
        assert_eq!(list.event_type(), EventType::Weighted);
        let events = list.weighted_events().unwrap();
        assert_relative_eq!(events[0].weight, 1.0);
        assert_relative_eq!(events[0].error_squared, 0.0);
        assert_relative_eq!(events[2].weight, 2.0);
        assert_relative_eq!(events[2].error_squared, 0.5);
    }

    #[test]
    fn test_push_into_no_time_list_degrades_event() {
        let mut list = EventList::with_event_type(EventType::WeightedNoTime);
        list.push_weighted(WeightedEvent::new(3.0, 5, 2.0, 0.5));
        list.push_tof(TofEvent::new(4.0, 9));
        assert_eq!(list.event_type(), EventType::WeightedNoTime);
        let events = list.weighted_no_time_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_relative_eq!(events[1].weight, 1.0);
        assert_relative_eq!(events[1].error_squared, 0.0);
    }

    #[test]
    fn test_push_plain_into_weighted_list_has_no_uncertainty() {
        let mut list = EventList::with_event_type(EventType::Weighted);
        list.push_weighted(WeightedEvent::new(1.0, 0, 3.0, 2.0));
        list.push_tof(TofEvent::new(2.0, 7));
        let events = list.weighted_events().unwrap();
        assert_eq!(events[1], WeightedEvent::new(2.0, 7, 1.0, 0.0));
    }

    #[test]
    fn test_push_no_time_degrades_list() {
        let mut list = plain(&[1.0]);
        list.push_weighted_no_time(WeightedEventNoTime::new(2.0, 3.0, 9.0));
        assert_eq!(list.event_type(), EventType::WeightedNoTime);
        assert_eq!(list.number_events(), 2);
    }

    #[test]
    fn test_switch_to_rules() {
        let mut list = plain(&[1.0]).with_detector_id(4);
        list.switch_to(EventType::Tof).unwrap();
        list.switch_to(EventType::Weighted).unwrap();
        assert!(matches!(list.switch_to(EventType::Tof), Err(Error::InvalidState(_))));
        list.switch_to(EventType::WeightedNoTime).unwrap();
        assert!(list.switch_to(EventType::Weighted).is_err());
        assert!(list.switch_to(EventType::Tof).is_err());
        assert_eq!(list.event_type(), EventType::WeightedNoTime);
        assert!(list.has_detector_id(4));
    }

    #[test]
    fn test_switch_preserves_sort_order() {
        let mut list = plain(&[3.0, 1.0, 2.0]);
        list.sort_tof();
        list.switch_to(EventType::Weighted).unwrap();
        assert!(list.is_sorted_by_tof());
    }

    #[test]
    fn test_merge_joins_types_and_ids() {
        let mut a = plain(&[1.0, 2.0]).with_detector_id(1);
        let mut b = EventList::with_event_type(EventType::Weighted).with_detector_id(2);
        b.push_weighted(WeightedEvent::new(3.0, 0, 0.5, 0.25));
        a.sort_tof();
        a += &b;
        assert_eq!(a.event_type(), EventType::Weighted);
        assert_eq!(a.number_events(), 3);
        assert_eq!(a.sort_order(), SortOrder::Unsorted);
        assert!(a.has_detector_id(1) && a.has_detector_id(2));
    }

    #[test]
    fn test_subtract_negates_weights() {
        let mut a = plain(&[1.0]);
        let b = plain(&[2.0, 3.0]);
        a -= &b;
        assert_eq!(a.event_type(), EventType::Weighted);
        let events = a.weighted_events().unwrap();
        assert_relative_eq!(events[0].weight, 1.0);
        assert_relative_eq!(events[0].error_squared, 0.0);
        assert_relative_eq!(events[1].weight, -1.0);
        assert_relative_eq!(events[1].error_squared, 0.0);
        assert_relative_eq!(events[2].weight, -1.0);
    }

    #[test]
    fn test_subtract_plain_from_no_time() {
        let mut a = EventList::with_event_type(EventType::WeightedNoTime);
        a.push_weighted_no_time(WeightedEventNoTime::new(1.0, 2.0, 4.0));
        let b = plain(&[5.0]);
        a.subtract(&b);
        let events = a.weighted_no_time_events().unwrap();
        assert_eq!(events[1], WeightedEventNoTime::new(5.0, -1.0, 0.0));
    }
}
