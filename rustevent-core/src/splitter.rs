//! Labeled pulse-time intervals used to filter and split event lists.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::event::PulseTime;

/// A half-open pulse-time interval `[start, stop)` with a destination index.
///
/// A non-negative `index` names the output the events go to (or marks them
/// as kept when filtering in place); a negative index discards them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplittingInterval {
    /// Inclusive start.
    pub start: PulseTime,
    /// Exclusive stop.
    pub stop: PulseTime,
    /// Destination index; negative means discard.
    pub index: i32,
}

impl SplittingInterval {
    /// Creates a new interval from nanosecond bounds.
    #[must_use]
    pub fn new(start: i64, stop: i64, index: i32) -> Self {
        Self {
            start: PulseTime(start),
            stop: PulseTime(stop),
            index,
        }
    }

    /// Returns true if `t` lies in `[start, stop)`.
    #[inline]
    #[must_use]
    pub fn contains(&self, t: PulseTime) -> bool {
        self.start <= t && t < self.stop
    }

    /// Returns true if events in this interval are kept.
    #[inline]
    #[must_use]
    pub fn is_kept(&self) -> bool {
        self.index >= 0
    }
}

/// A validated, time-ordered set of disjoint intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSplitter {
    intervals: Vec<SplittingInterval>,
}

impl TimeSplitter {
    /// Builds a splitter.
    ///
    /// # Errors
    /// Returns an error if any interval has `stop <= start`, or the intervals
    /// are not ordered by start time and non-overlapping.
    pub fn new(intervals: Vec<SplittingInterval>) -> Result<Self> {
        if let Some(bad) = intervals.iter().find(|i| i.stop <= i.start) {
            return Err(Error::invalid_argument(format!(
                "empty splitting interval [{}, {})",
                bad.start.as_nanoseconds(),
                bad.stop.as_nanoseconds()
            )));
        }
        if let Some(pair) = intervals.windows(2).find(|w| w[1].start < w[0].stop) {
            return Err(Error::invalid_argument(format!(
                "splitting intervals overlap or are out of order: [{}, {}) then [{}, {})",
                pair[0].start.as_nanoseconds(),
                pair[0].stop.as_nanoseconds(),
                pair[1].start.as_nanoseconds(),
                pair[1].stop.as_nanoseconds()
            )));
        }
        Ok(Self { intervals })
    }

    /// A splitter with a single interval.
    ///
    /// # Errors
    /// Returns an error if `stop <= start`.
    pub fn single(start: i64, stop: i64, index: i32) -> Result<Self> {
        Self::new(vec![SplittingInterval::new(start, stop, index)])
    }

    /// The intervals in time order.
    #[must_use]
    pub fn intervals(&self) -> &[SplittingInterval] {
        &self.intervals
    }

    /// Number of intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns true if there are no intervals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterates over the intervals in time order.
    pub fn iter(&self) -> impl Iterator<Item = &SplittingInterval> {
        self.intervals.iter()
    }

    /// Largest destination index, if any interval is kept.
    #[must_use]
    pub fn max_index(&self) -> Option<i32> {
        self.intervals.iter().map(|i| i.index).filter(|&i| i >= 0).max()
    }
}

impl<'a> IntoIterator for &'a TimeSplitter {
    type Item = &'a SplittingInterval;
    type IntoIter = std::slice::Iter<'a, SplittingInterval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
