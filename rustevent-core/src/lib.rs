//! rustevent-core: Core types for time-of-flight event data.
//!
//! This crate provides the event representations (plain, weighted and
//! weighted-without-time), the event-type lattice, the sort-order cache
//! states, copy-on-write bin edges and time splitters used by the
//! event-list engine.
//!

pub mod bins;
pub mod error;
pub mod event;
pub mod memory;
pub mod order;
pub mod splitter;

pub use bins::BinEdges;
pub use error::{Error, Result};
pub use event::{
    Event, PulseTime, TimedEvent, TofEvent, WeightedEvent, WeightedEventNoTime, WeightedMut,
};
pub use memory::ReleaseMemory;
pub use order::{EventType, SortOrder};
pub use splitter::{SplittingInterval, TimeSplitter};

/// Integer key identifying a physical detector pixel.
pub type DetectorId = i32;
