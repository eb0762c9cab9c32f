//! Event-type lattice and sort-order states.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::event::{TofEvent, WeightedEvent, WeightedEventNoTime};

/// Which representation an event list currently holds.
///
/// Variants are declared from least to most general, so `Ord` is the
/// promotion lattice: a list can move up (`Tof` → `Weighted` →
/// `WeightedNoTime`) but never down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventType {
    /// Plain events (time-of-flight and pulse time).
    #[default]
    Tof,
    /// Weighted events with pulse time.
    Weighted,
    /// Weighted events without pulse time.
    WeightedNoTime,
}

impl EventType {
    /// The least general type able to hold both `self` and `other`.
    #[inline]
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        self.max(other)
    }

    /// Returns true if events of this type carry a pulse time.
    #[inline]
    #[must_use]
    pub fn has_pulse_time(self) -> bool {
        !matches!(self, Self::WeightedNoTime)
    }

    /// Returns true if events of this type carry an explicit weight.
    #[inline]
    #[must_use]
    pub fn has_weights(self) -> bool {
        !matches!(self, Self::Tof)
    }

    /// Size in bytes of one event of this type.
    #[must_use]
    pub fn event_size(self) -> usize {
        match self {
            Self::Tof => std::mem::size_of::<TofEvent>(),
            Self::Weighted => std::mem::size_of::<WeightedEvent>(),
            Self::WeightedNoTime => std::mem::size_of::<WeightedEventNoTime>(),
        }
    }

    /// Stable name used in logs and file headers.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Tof => "tof",
            Self::Weighted => "weighted",
            Self::WeightedNoTime => "weighted_no_time",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cached sort state of an event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SortOrder {
    /// No order is known.
    #[default]
    Unsorted,
    /// Ascending time-of-flight.
    Tof,
    /// Ascending pulse time.
    PulseTime,
}
