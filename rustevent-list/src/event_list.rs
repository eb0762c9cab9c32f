//! The event list container: storage, accessors and bookkeeping.

use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeSet;
use std::mem::size_of;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rustevent_core::{
    BinEdges, DetectorId, Error, Event, EventType, Result, SortOrder, TofEvent, WeightedEvent,
    WeightedEventNoTime,
};

/// The active event storage of a list. Exactly one representation exists at
/// a time; the variant is the event type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Events {
    /// Plain events.
    Tof(Vec<TofEvent>),
    /// Weighted events with pulse time.
    Weighted(Vec<WeightedEvent>),
    /// Weighted events without pulse time.
    WeightedNoTime(Vec<WeightedEventNoTime>),
}

impl Default for Events {
    fn default() -> Self {
        Self::Tof(Vec::new())
    }
}

impl Events {
    /// Empty storage of the given type.
    #[must_use]
    pub fn empty(event_type: EventType) -> Self {
        match event_type {
            EventType::Tof => Self::Tof(Vec::new()),
            EventType::Weighted => Self::Weighted(Vec::new()),
            EventType::WeightedNoTime => Self::WeightedNoTime(Vec::new()),
        }
    }

    /// The representation held.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Tof(_) => EventType::Tof,
            Self::Weighted(_) => EventType::Weighted,
            Self::WeightedNoTime(_) => EventType::WeightedNoTime,
        }
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        with_events!(self, v => v.len())
    }

    /// Returns true if there are no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        with_events!(self, v => v.is_empty())
    }

    /// Allocated capacity in events.
    #[must_use]
    pub fn capacity(&self) -> usize {
        with_events!(self, v => v.capacity())
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for rustevent_core::TofEvent {}
    impl Sealed for rustevent_core::WeightedEvent {}
    impl Sealed for rustevent_core::WeightedEventNoTime {}
}

/// An event representation that can live in an [`EventList`].
pub trait StoredEvent: Event + private::Sealed {
    /// The list type holding this representation.
    const EVENT_TYPE: EventType;

    /// The vector of this representation, if it is the active one.
    fn vec(events: &Events) -> Option<&Vec<Self>>;

    /// Mutable access to the vector of this representation, if active.
    fn vec_mut(events: &mut Events) -> Option<&mut Vec<Self>>;

    /// Wraps a vector as list storage.
    fn wrap(events: Vec<Self>) -> Events;
}

impl StoredEvent for TofEvent {
    const EVENT_TYPE: EventType = EventType::Tof;

    fn vec(events: &Events) -> Option<&Vec<Self>> {
        match events {
            Events::Tof(v) => Some(v),
            _ => None,
        }
    }

    fn vec_mut(events: &mut Events) -> Option<&mut Vec<Self>> {
        match events {
            Events::Tof(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(events: Vec<Self>) -> Events {
        Events::Tof(events)
    }
}

impl StoredEvent for WeightedEvent {
    const EVENT_TYPE: EventType = EventType::Weighted;

    fn vec(events: &Events) -> Option<&Vec<Self>> {
        match events {
            Events::Weighted(v) => Some(v),
            _ => None,
        }
    }

    fn vec_mut(events: &mut Events) -> Option<&mut Vec<Self>> {
        match events {
            Events::Weighted(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(events: Vec<Self>) -> Events {
        Events::Weighted(events)
    }
}

impl StoredEvent for WeightedEventNoTime {
    const EVENT_TYPE: EventType = EventType::WeightedNoTime;

    fn vec(events: &Events) -> Option<&Vec<Self>> {
        match events {
            Events::WeightedNoTime(v) => Some(v),
            _ => None,
        }
    }

    fn vec_mut(events: &mut Events) -> Option<&mut Vec<Self>> {
        match events {
            Events::WeightedNoTime(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(events: Vec<Self>) -> Events {
        Events::WeightedNoTime(events)
    }
}

/// Events recorded by one detector spectrum.
///
/// The list starts out plain and unsorted. Operations that need weights or
/// drop pulse times promote it (`Tof` → `Weighted` → `WeightedNoTime`);
/// promotion never goes back down.
///
/// Sorting is allowed through `&self`: the event storage is a `RefCell` and
/// the sort state a `Cell`. Holding a guard returned by [`EventList::events`]
/// or one of the typed accessors while calling a method that sorts panics.
#[derive(Debug, Clone, Default)]
pub struct EventList {
    pub(crate) events: RefCell<Events>,
    pub(crate) order: Cell<SortOrder>,
    pub(crate) x: BinEdges,
    pub(crate) detector_ids: BTreeSet<DetectorId>,
}

impl PartialEq for EventList {
    /// Lists are equal when they hold the same events in the same order.
    fn eq(&self, other: &Self) -> bool {
        *self.events.borrow() == *other.events.borrow()
    }
}

impl EventList {
    /// Creates an empty plain list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty list of the given type.
    #[must_use]
    pub fn with_event_type(event_type: EventType) -> Self {
        Self::from_events(Events::empty(event_type))
    }

    /// Creates an unsorted list owning `events`.
    #[must_use]
    pub fn from_events(events: Events) -> Self {
        Self {
            events: RefCell::new(events),
            ..Self::default()
        }
    }

    /// Adds a detector ID (builder style).
    #[must_use]
    pub fn with_detector_id(mut self, id: DetectorId) -> Self {
        self.detector_ids.insert(id);
        self
    }

    /// Sets the bin edges (builder style).
    #[must_use]
    pub fn with_x(mut self, x: BinEdges) -> Self {
        self.x = x;
        self
    }

    /// Consumes the list, returning its storage.
    #[must_use]
    pub fn into_events(self) -> Events {
        self.events.into_inner()
    }

    /// The representation currently held.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.events.borrow().event_type()
    }

    /// Returns true if events carry explicit weights.
    #[must_use]
    pub fn has_weights(&self) -> bool {
        self.event_type().has_weights()
    }

    /// Number of events.
    #[must_use]
    pub fn number_events(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns true if the list holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// The cached sort state.
    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.order.get()
    }

    /// Returns true if the events are known to be sorted by time-of-flight.
    #[must_use]
    pub fn is_sorted_by_tof(&self) -> bool {
        self.order.get() == SortOrder::Tof
    }

    /// Borrowed view of whichever representation is active.
    ///
    /// This is the entry point for serializers: match on the returned
    /// [`Events`] to iterate typed events in storage order.
    ///
    /// # Panics
    /// Panics if called while the list is being sorted on the same thread.
    #[must_use]
    pub fn events(&self) -> Ref<'_, Events> {
        self.events.borrow()
    }

    /// Borrowed slice of events of representation `E`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the list holds another representation.
    pub fn events_of<E: StoredEvent>(&self) -> Result<Ref<'_, [E]>> {
        Ref::filter_map(self.events.borrow(), |events| E::vec(events).map(Vec::as_slice))
            .map_err(|events| kind_mismatch(E::EVENT_TYPE, events.event_type()))
    }

    /// Mutable vector of representation `E`. Marks the list unsorted.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the list holds another representation.
    pub fn events_of_mut<E: StoredEvent>(&mut self) -> Result<&mut Vec<E>> {
        let current = self.events.get_mut().event_type();
        let order = &self.order;
        match E::vec_mut(self.events.get_mut()) {
            Some(events) => {
                order.set(SortOrder::Unsorted);
                Ok(events)
            }
            None => Err(kind_mismatch(E::EVENT_TYPE, current)),
        }
    }

    /// Plain events.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the list is not plain.
    pub fn tof_events(&self) -> Result<Ref<'_, [TofEvent]>> {
        self.events_of()
    }

    /// Weighted events.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the list is not weighted.
    pub fn weighted_events(&self) -> Result<Ref<'_, [WeightedEvent]>> {
        self.events_of()
    }

    /// Weighted events without pulse time.
    ///
    /// # Errors
    /// Returns [`Error::InvalidState`] if the list is not weighted-no-time.
    pub fn weighted_no_time_events(&self) -> Result<Ref<'_, [WeightedEventNoTime]>> {
        self.events_of()
    }

    /// Removes every event, keeping the representation.
    ///
    /// The allocation is released, not just emptied.
    pub fn clear(&mut self, remove_detector_ids: bool) {
        let event_type = self.events.get_mut().event_type();
        *self.events.get_mut() = Events::empty(event_type);
        self.order.set(SortOrder::Unsorted);
        if remove_detector_ids {
            self.detector_ids.clear();
        }
    }

    /// Replaces storage with an empty vector of `event_type`, ignoring the
    /// promotion lattice. Used for outputs that take on a source's type.
    pub(crate) fn reset_to(&mut self, event_type: EventType) {
        *self.events.get_mut() = Events::empty(event_type);
        self.order.set(SortOrder::Unsorted);
    }

    /// Reserves room for `additional` more events.
    pub fn reserve(&mut self, additional: usize) {
        with_events!(self.events.get_mut(), v => v.reserve(additional));
    }

    /// Estimated heap and inline footprint in bytes.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        let events = self.events.borrow();
        size_of::<Self>()
            + events.capacity() * events.event_type().event_size()
            + self.detector_ids.len() * size_of::<DetectorId>()
            + self.x.len() * size_of::<f64>()
    }

    /// Detector IDs contributing to this list.
    #[must_use]
    pub fn detector_ids(&self) -> &BTreeSet<DetectorId> {
        &self.detector_ids
    }

    /// Adds one detector ID.
    pub fn add_detector_id(&mut self, id: DetectorId) {
        self.detector_ids.insert(id);
    }

    /// Adds several detector IDs.
    pub fn add_detector_ids<I: IntoIterator<Item = DetectorId>>(&mut self, ids: I) {
        self.detector_ids.extend(ids);
    }

    /// Replaces all detector IDs with `id`.
    pub fn set_detector_id(&mut self, id: DetectorId) {
        self.detector_ids.clear();
        self.detector_ids.insert(id);
    }

    /// Removes all detector IDs.
    pub fn clear_detector_ids(&mut self) {
        self.detector_ids.clear();
    }

    /// Returns true if `id` contributes to this list.
    #[must_use]
    pub fn has_detector_id(&self, id: DetectorId) -> bool {
        self.detector_ids.contains(&id)
    }

    /// Shared handle to the bin edges.
    #[must_use]
    pub fn x(&self) -> &BinEdges {
        &self.x
    }

    /// Read-only bin edges. Never copies.
    #[must_use]
    pub fn data_x(&self) -> &[f64] {
        self.x.as_slice()
    }

    /// Writable bin edges, copied first if shared with another list.
    pub fn data_x_mut(&mut self) -> &mut Vec<f64> {
        self.x.make_mut()
    }

    /// Shares `x` as this list's bin edges.
    pub fn set_x(&mut self, x: BinEdges) {
        self.x = x;
    }
}

pub(crate) fn kind_mismatch(requested: EventType, current: EventType) -> Error {
    Error::invalid_state(format!(
        "requested {requested} events but the list holds {current} events"
    ))
}

pub(crate) fn no_pulse_time(operation: &str) -> Error {
    Error::invalid_state(format!(
        "cannot {operation}: weighted_no_time events have no pulse time"
    ))
}
