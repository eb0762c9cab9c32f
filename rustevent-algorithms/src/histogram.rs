//! Histogram synthesis and integration over TOF-sorted events.
//!
//! All functions here assume the slice is sorted by ascending
//! time-of-flight. The bin cursor only moves forward, so binning `n` events
//! into `m` bins costs O(n + m).

use std::ops::Range;

use rustevent_core::bins::validate_edges;
use rustevent_core::{Event, Result};

/// Counts and uncertainties for one set of bin edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    /// Summed weights per bin (plain counts for unweighted events).
    pub counts: Vec<f64>,
    /// Uncertainty per bin; empty when errors were skipped.
    pub errors: Vec<f64>,
}

impl Histogram {
    /// Number of bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if there are no bins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum over all bins.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// An all-zero histogram for `edges`.
    #[must_use]
    pub fn zeros(edges: &[f64], skip_errors: bool) -> Self {
        let bins = edges.len().saturating_sub(1);
        Self {
            counts: vec![0.0; bins],
            errors: if skip_errors { Vec::new() } else { vec![0.0; bins] },
        }
    }

    /// Bins TOF-sorted `events` into `edges`.
    ///
    /// Events below the first edge, at/above the last edge or with a NaN
    /// TOF are dropped.
    /// An event exactly on an inner edge lands in the bin that edge opens.
    /// Plain events contribute 1 with variance 1, so their error is the
    /// square root of the count.
    ///
    /// # Errors
    /// Returns an error if `edges` has fewer than two values or is not
    /// strictly increasing.
    pub fn from_sorted<E: Event>(events: &[E], edges: &[f64], skip_errors: bool) -> Result<Self> {
        validate_edges(edges)?;
        debug_assert!(events
            .windows(2)
            .all(|w| w[0].tof().total_cmp(&w[1].tof()).is_le()));

        let bins = edges.len() - 1;
        let mut counts = vec![0.0; bins];
        let mut variance = if skip_errors {
            Vec::new()
        } else {
            vec![0.0; bins]
        };

        let mut bin = 0;
        for event in &events[range_tof(events, edges[0], edges[bins])] {
            let tof = event.tof();
            while bin + 1 < bins && tof >= edges[bin + 1] {
                bin += 1;
            }
            counts[bin] += event.weight();
            if !skip_errors {
                variance[bin] += event.error_squared();
            }
        }

        for v in &mut variance {
            *v = v.sqrt();
        }
        Ok(Self {
            counts,
            errors: variance,
        })
    }
}

/// Index of the first event with `tof >= value`.
#[inline]
pub fn lower_bound_tof<E: Event>(events: &[E], value: f64) -> usize {
    events.partition_point(|e| e.tof() < value)
}

/// Index of the first event with `tof > value`.
#[inline]
pub fn upper_bound_tof<E: Event>(events: &[E], value: f64) -> usize {
    events.partition_point(|e| e.tof() <= value)
}

/// Index range of TOF-sorted events with `min <= tof < max`.
///
/// `total_cmp` places a NaN TOF at either end of the slice depending on its
/// sign bit; such events are never inside the range.
pub fn range_tof<E: Event>(events: &[E], min: f64, max: f64) -> Range<usize> {
    let lead = events.iter().take_while(|e| e.tof().is_nan()).count();
    let rest = &events[lead..];
    let low = lead + lower_bound_tof(rest, min);
    let high = (lead + lower_bound_tof(rest, max)).max(low);
    low..high
}

/// Sums weights and propagated error of TOF-sorted events in `[min, max)`.
///
/// With `entire_range` the bounds are ignored and every event counts.
/// Returns `(sum, error)`.
pub fn integrate<E: Event>(events: &[E], min: f64, max: f64, entire_range: bool) -> (f64, f64) {
    let slice = if entire_range {
        events
    } else {
        &events[range_tof(events, min, max)]
    };
    let (sum, variance) = slice.iter().fold((0.0, 0.0), |(s, v), e| {
        (s + e.weight(), v + e.error_squared())
    });
    (sum, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustevent_core::{TofEvent, WeightedEvent, WeightedEventNoTime};

    fn plain(tofs: &[f64]) -> Vec<TofEvent> {
        tofs.iter().map(|&t| TofEvent::new(t, 0)).collect()
    }

    #[test]
    fn test_counts_and_poisson_errors() {
        let events = plain(&[10.0, 15.0, 20.0]);
        let hist = Histogram::from_sorted(&events, &[0.0, 12.0, 25.0], false).unwrap();
        assert_eq!(hist.counts, vec![1.0, 2.0]);
        assert_relative_eq!(hist.errors[0], 1.0);
        assert_relative_eq!(hist.errors[1], 2.0_f64.sqrt());
    }

    #[test]
    fn test_edge_event_goes_to_upper_bin() {
        let events = plain(&[0.0, 5.0, 10.0]);
        let hist = Histogram::from_sorted(&events, &[0.0, 5.0, 10.0], true).unwrap();
        // 0.0 opens bin 0, 5.0 opens bin 1, 10.0 is the last edge and dropped.
        assert_eq!(hist.counts, vec![1.0, 1.0]);
        assert!(hist.errors.is_empty());
    }

    #[test]
    fn test_out_of_range_events_dropped() {
        let events = plain(&[-1.0, 1.0, 2.0, 100.0]);
        let hist = Histogram::from_sorted(&events, &[0.0, 1.5, 3.0], false).unwrap();
        assert_eq!(hist.counts, vec![1.0, 1.0]);
        assert_relative_eq!(hist.total(), 2.0);
    }

    #[test]
    fn test_sparse_bins_are_skipped() {
        let events = plain(&[0.5, 9.5]);
        let edges: Vec<f64> = (0..=10).map(f64::from).collect();
        let hist = Histogram::from_sorted(&events, &edges, true).unwrap();
        assert_relative_eq!(hist.counts[0], 1.0);
        assert_relative_eq!(hist.counts[9], 1.0);
        assert_relative_eq!(hist.total(), 2.0);
    }

    #[test]
    fn test_weighted_sums() {
        let events = vec![
            WeightedEvent::new(1.0, 0, 2.0, 1.0),
            WeightedEvent::new(2.0, 0, 3.0, 3.0),
            WeightedEvent::new(7.0, 0, 0.5, 0.25),
        ];
        let hist = Histogram::from_sorted(&events, &[0.0, 5.0, 10.0], false).unwrap();
        assert_relative_eq!(hist.counts[0], 5.0);
        assert_relative_eq!(hist.errors[0], 2.0);
        assert_relative_eq!(hist.counts[1], 0.5);
        assert_relative_eq!(hist.errors[1], 0.5);
    }

    #[test]
    fn test_invalid_edges() {
        let events: Vec<WeightedEventNoTime> = Vec::new();
        assert!(Histogram::from_sorted(&events, &[1.0], false).is_err());
        assert!(Histogram::from_sorted(&events, &[1.0, 0.0], false).is_err());
        let hist = Histogram::from_sorted(&events, &[0.0, 1.0], false).unwrap();
        assert_eq!(hist, Histogram::zeros(&[0.0, 1.0], false));
    }

    #[test]
    fn test_nan_tof_is_never_binned() {
        let mut events = plain(&[1.0, f64::NAN, -f64::NAN, 6.0]);
        events.sort_by(|a, b| a.tof.total_cmp(&b.tof));
        let hist = Histogram::from_sorted(&events, &[0.0, 5.0, 10.0], false).unwrap();
        assert_eq!(hist.counts, vec![1.0, 1.0]);
        assert_eq!(range_tof(&events, 0.0, 10.0), 1..3);

        let trailing = plain(&[1.0, f64::NAN]);
        let hist = Histogram::from_sorted(&trailing, &[0.0, 5.0, 10.0], true).unwrap();
        assert_eq!(hist.counts, vec![1.0, 0.0]);
    }

    #[test]
    fn test_bounds() {
        let events = plain(&[1.0, 2.0, 2.0, 3.0]);
        assert_eq!(lower_bound_tof(&events, 2.0), 1);
        assert_eq!(upper_bound_tof(&events, 2.0), 3);
        assert_eq!(lower_bound_tof(&events, 0.0), 0);
        assert_eq!(upper_bound_tof(&events, 5.0), 4);
    }

    #[test]
    fn test_integrate() {
        let events = plain(&[1.0, 2.0, 3.0, 4.0]);
        let (sum, err) = integrate(&events, 2.0, 4.0, false);
        assert_relative_eq!(sum, 2.0);
        assert_relative_eq!(err, 2.0_f64.sqrt());
        let (sum, _) = integrate(&events, 0.0, 0.0, true);
        assert_relative_eq!(sum, 4.0);
        let (sum, err) = integrate(&events, 5.0, 1.0, false);
        assert_relative_eq!(sum, 0.0);
        assert_relative_eq!(err, 0.0);
    }
}
