//! rustevent-algorithms: Kernels over sorted and unsorted event slices.
//!
//! Everything here works on plain slices of events and is generic over the
//! event traits from `rustevent-core`:
//! - **sort** - serial, 2-way and 4-way parallel sorts with strategy selection
//! - **histogram** - single forward scan binning and integration
//! - **scaling** - per-bin multiply/divide with uncertainty propagation
//! - **compress** - greedy tolerance grouping into weighted events
//! - **interval** - pulse-time interval filtering and splitting
//!
#![warn(missing_docs)]

pub mod compress;
pub mod histogram;
pub mod interval;
pub mod scaling;
pub mod sort;

pub use compress::compress_events;
pub use histogram::{integrate, lower_bound_tof, range_tof, upper_bound_tof, Histogram};
pub use interval::{interval_slices, pulse_time_range, retain_in_intervals};
pub use scaling::{check_histogram_inputs, scale_by_histogram, BinOperation};
pub use sort::{
    compare_pulse_time, compare_tof, sort_with_strategy, SortConfig, SortStrategy,
};
