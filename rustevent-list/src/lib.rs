//! rustevent-list: The event list container.
//!
//! An [`EventList`] stores the neutron events of one detector spectrum in
//! one of three representations (plain, weighted, weighted without pulse
//! time), promotes itself when an operation needs more information, and
//! caches whether its events are sorted so order-dependent operations
//! (histogramming, masking, compression, time filtering) only sort when they
//! have to.
//!
//! # Threading
//! A list is `Send` but not `Sync`: it can be moved to a worker thread, and
//! many lists can be processed in parallel (one list per worker, e.g.
//! `par_iter_mut` over a slice of lists), but a single list is never shared
//! between threads. Sorting through `&EventList` relies on this.
//!
#![warn(missing_docs)]

#[macro_use]
mod macros;

mod append;
mod arithmetic;
mod event_list;
mod filter;
mod histogram;
mod sorting;

pub use event_list::{EventList, Events, StoredEvent};

// Re-export the types that appear in the list's signatures.
pub use rustevent_algorithms::{Histogram, SortConfig, SortStrategy};
pub use rustevent_core::{
    BinEdges, DetectorId, Error, EventType, PulseTime, Result, SortOrder, SplittingInterval,
    TimeSplitter, TofEvent, WeightedEvent, WeightedEventNoTime,
};
