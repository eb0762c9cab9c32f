//! Sorting and the sort-order cache.

use log::trace;
use rustevent_algorithms::sort::{compare_pulse_time, compare_tof};
use rustevent_algorithms::SortConfig;
use rustevent_core::{Result, SortOrder};

use crate::event_list::{no_pulse_time, EventList, Events};

impl EventList {
    /// Sorts into `order` with the default [`SortConfig`].
    ///
    /// Sorting to [`SortOrder::Unsorted`] does nothing.
    ///
    /// # Errors
    /// Returns [`rustevent_core::Error::InvalidState`] when asked to sort a
    /// weighted-no-time list by pulse time.
    pub fn sort(&self, order: SortOrder) -> Result<()> {
        self.sort_with(order, &SortConfig::default())
    }

    /// Sorts into `order`, choosing a strategy with `config`.
    ///
    /// # Errors
    /// See [`EventList::sort`].
    pub fn sort_with(&self, order: SortOrder, config: &SortConfig) -> Result<()> {
        match order {
            SortOrder::Unsorted => Ok(()),
            SortOrder::Tof => {
                self.sort_tof_with(config);
                Ok(())
            }
            SortOrder::PulseTime => self.sort_pulse_time_with(config),
        }
    }

    /// Sorts by time-of-flight. Free if already TOF-sorted.
    pub fn sort_tof(&self) {
        self.sort_tof_with(&SortConfig::default());
    }

    /// Sorts by time-of-flight with an explicit configuration.
    pub fn sort_tof_with(&self, config: &SortConfig) {
        if self.order.get() == SortOrder::Tof {
            return;
        }
        let mut events = self.events.borrow_mut();
        let strategy = with_events!(&mut *events, v => config.sort_by(v, compare_tof));
        trace!("sorted {} events by tof ({strategy:?})", events.len());
        self.order.set(SortOrder::Tof);
    }

    /// Sorts by pulse time. Free if already pulse-time-sorted.
    ///
    /// # Errors
    /// Returns [`rustevent_core::Error::InvalidState`] for weighted-no-time lists.
    pub fn sort_pulse_time(&self) -> Result<()> {
        self.sort_pulse_time_with(&SortConfig::default())
    }

    /// Sorts by pulse time with an explicit configuration.
    ///
    /// # Errors
    /// Returns [`rustevent_core::Error::InvalidState`] for weighted-no-time lists.
    pub fn sort_pulse_time_with(&self, config: &SortConfig) -> Result<()> {
        if self.order.get() == SortOrder::PulseTime {
            return Ok(());
        }
        let mut events = self.events.borrow_mut();
        let strategy = match &mut *events {
            Events::Tof(v) => config.sort_by(v, compare_pulse_time),
            Events::Weighted(v) => config.sort_by(v, compare_pulse_time),
            Events::WeightedNoTime(_) => return Err(no_pulse_time("sort by pulse time")),
        };
        trace!("sorted {} events by pulse time ({strategy:?})", events.len());
        self.order.set(SortOrder::PulseTime);
        Ok(())
    }
}
