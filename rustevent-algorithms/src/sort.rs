//! Serial and partitioned parallel sorting of event vectors.
//!
//! # Strategies
//! - **Serial**: `sort_unstable_by` on the whole vector.
//! - **2-way**: sort both halves concurrently, merge them into a fresh
//!   buffer and swap it in.
//! - **4-way**: sort four quarters concurrently, merge them pairwise into two
//!   buffers (concurrently), then merge those back over the original storage.
//!
//! Both parallel variants hold roughly twice the event storage while they
//! run. [`SortConfig::select`] only picks them when that extra buffer fits in
//! the memory budget. The strategy never changes the sorted result, only the
//! wall-clock cost; the order of equal keys is unspecified in every strategy.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use rustevent_core::{Error, Event, ReleaseMemory, Result, TimedEvent};
use sysinfo::System;

/// How a sort is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortStrategy {
    /// Single-threaded sort.
    Serial,
    /// Two partitions sorted concurrently, then merged.
    TwoWay,
    /// Four partitions sorted concurrently, then merged as two pairs.
    FourWay,
}

/// Configuration for sort strategy selection.
#[derive(Clone)]
pub struct SortConfig {
    /// Minimum event count for the 2-way sort.
    pub two_way_threshold: usize,
    /// Minimum event count for the 4-way sort.
    pub four_way_threshold: usize,
    /// Upper bound on worker threads considered (defaults to the rayon pool size).
    pub max_parallelism: Option<usize>,
    /// Fraction of available system memory the temporary buffer may use.
    pub memory_fraction: f64,
    /// Explicit memory budget override (bytes). If set, `memory_fraction` is ignored.
    pub memory_budget_bytes: Option<usize>,
    /// Called after a parallel sort has dropped its temporary buffer.
    pub release_hook: Option<Arc<dyn ReleaseMemory>>,
}

impl fmt::Debug for SortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortConfig")
            .field("two_way_threshold", &self.two_way_threshold)
            .field("four_way_threshold", &self.four_way_threshold)
            .field("max_parallelism", &self.max_parallelism)
            .field("memory_fraction", &self.memory_fraction)
            .field("memory_budget_bytes", &self.memory_budget_bytes)
            .field("release_hook", &self.release_hook.is_some())
            .finish()
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            two_way_threshold: 500_000,
            four_way_threshold: 2_000_000,
            max_parallelism: None,
            memory_fraction: 0.5,
            memory_budget_bytes: None,
            release_hook: None,
        }
    }
}

impl SortConfig {
    /// A configuration that always sorts on the calling thread.
    #[must_use]
    pub fn serial() -> Self {
        Self {
            two_way_threshold: usize::MAX,
            four_way_threshold: usize::MAX,
            ..Self::default()
        }
    }

    /// Set the minimum event count for the 2-way sort.
    #[must_use]
    pub fn with_two_way_threshold(mut self, events: usize) -> Self {
        self.two_way_threshold = events;
        self
    }

    /// Set the minimum event count for the 4-way sort.
    #[must_use]
    pub fn with_four_way_threshold(mut self, events: usize) -> Self {
        self.four_way_threshold = events;
        self
    }

    /// Cap the number of worker threads considered.
    ///
    /// Values less than 1 are clamped to 1.
    #[must_use]
    pub fn with_max_parallelism(mut self, threads: usize) -> Self {
        self.max_parallelism = Some(threads.max(1));
        self
    }

    /// Set the fraction of available system memory to allow.
    #[must_use]
    pub fn with_memory_fraction(mut self, fraction: f64) -> Self {
        self.memory_fraction = fraction;
        self
    }

    /// Set an explicit memory budget in bytes.
    #[must_use]
    pub fn with_memory_budget_bytes(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = Some(bytes);
        self
    }

    /// Install a hook called after parallel sorts release their buffer.
    #[must_use]
    pub fn with_release_hook(mut self, hook: Arc<dyn ReleaseMemory>) -> Self {
        self.release_hook = Some(hook);
        self
    }

    /// Fallible variant of [`Self::with_memory_fraction`].
    ///
    /// # Errors
    /// Returns an error if `fraction` is not in `(0.0, 1.0]`.
    pub fn try_with_memory_fraction(mut self, fraction: f64) -> Result<Self> {
        if !(0.0 < fraction && fraction <= 1.0) {
            return Err(Error::invalid_argument(
                "memory_fraction must be in (0.0, 1.0]",
            ));
        }
        self.memory_fraction = fraction;
        Ok(self)
    }

    /// Fallible variant of [`Self::with_max_parallelism`].
    ///
    /// # Errors
    /// Returns an error if `threads` is 0.
    pub fn try_with_max_parallelism(mut self, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::invalid_argument("parallelism must be at least 1"));
        }
        self.max_parallelism = Some(threads);
        Ok(self)
    }

    /// Worker threads available to a parallel sort.
    #[must_use]
    pub fn effective_parallelism(&self) -> usize {
        let pool = rayon::current_num_threads().max(1);
        self.max_parallelism.map_or(pool, |max| max.min(pool))
    }

    /// Bytes a parallel sort may spend on its merge buffer.
    ///
    /// Merging the sorted runs copies the whole slice once, so
    /// [`SortConfig::select`] only picks a parallel strategy when
    /// `len * event_size` fits in this budget. An explicit
    /// [`SortConfig::with_memory_budget_bytes`] is returned as is; otherwise
    /// the budget is `memory_fraction` of the memory reported available.
    ///
    /// # Errors
    /// Returns an error if the memory fraction is outside `(0, 1]` or the
    /// available memory is reported as zero.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn resolve_budget_bytes(&self) -> Result<usize> {
        if let Some(bytes) = self.memory_budget_bytes {
            return Ok(bytes);
        }
        let fraction = self.memory_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::invalid_argument(format!(
                "sort memory fraction {fraction} is outside (0, 1]"
            )));
        }
        let mut system = System::new();
        system.refresh_memory();
        match system.available_memory() {
            0 => Err(Error::invalid_state(
                "no available memory reported for the sort merge buffer",
            )),
            available => {
                let budget = (available as f64 * fraction).floor() as u64;
                Ok(usize::try_from(budget).unwrap_or(usize::MAX))
            }
        }
    }

    /// Pick a strategy for `len` events of `event_size` bytes each.
    ///
    /// System memory is only queried when a parallel strategy is a candidate.
    #[must_use]
    pub fn select(&self, len: usize, event_size: usize) -> SortStrategy {
        let threads = self.effective_parallelism();
        let candidate = if len >= self.four_way_threshold && threads >= 4 {
            SortStrategy::FourWay
        } else if len >= self.two_way_threshold && threads >= 2 {
            SortStrategy::TwoWay
        } else {
            return SortStrategy::Serial;
        };

        let needed = len.saturating_mul(event_size);
        match self.resolve_budget_bytes() {
            Ok(budget) if needed <= budget => {
                debug!("sorting {len} events with {candidate:?} ({threads} threads)");
                candidate
            }
            Ok(budget) => {
                debug!(
                    "merge buffer of {needed} bytes exceeds budget of {budget} bytes, sorting serially"
                );
                SortStrategy::Serial
            }
            Err(err) => {
                warn!("could not resolve sort memory budget ({err}), sorting serially");
                SortStrategy::Serial
            }
        }
    }

    /// Sort `events` with the strategy selected for their size.
    ///
    /// Returns the strategy that was used.
    pub fn sort_by<T, F>(&self, events: &mut Vec<T>, compare: F) -> SortStrategy
    where
        T: Copy + Send + Sync,
        F: Fn(&T, &T) -> Ordering + Sync,
    {
        let strategy = self.select(events.len(), std::mem::size_of::<T>());
        sort_with_strategy(events, strategy, compare);
        if strategy != SortStrategy::Serial {
            if let Some(hook) = &self.release_hook {
                hook.release_free_memory();
            }
        }
        strategy
    }
}

/// Orders events by time-of-flight.
#[inline]
pub fn compare_tof<E: Event>(a: &E, b: &E) -> Ordering {
    a.tof().total_cmp(&b.tof())
}

/// Orders events by pulse time.
#[inline]
pub fn compare_pulse_time<E: TimedEvent>(a: &E, b: &E) -> Ordering {
    a.pulse_time().cmp(&b.pulse_time())
}

/// Sort `events` using an explicit strategy.
pub fn sort_with_strategy<T, F>(events: &mut Vec<T>, strategy: SortStrategy, compare: F)
where
    T: Copy + Send + Sync,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    match strategy {
        SortStrategy::Serial => events.sort_unstable_by(&compare),
        SortStrategy::TwoWay => sort_two_way(events, &compare),
        SortStrategy::FourWay => sort_four_way(events, &compare),
    }
}

fn sort_two_way<T, F>(events: &mut Vec<T>, compare: &F)
where
    T: Copy + Send + Sync,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    if events.len() < 2 {
        return;
    }
    let mid = events.len() / 2;
    {
        let (left, right) = events.split_at_mut(mid);
        rayon::join(
            || left.sort_unstable_by(compare),
            || right.sort_unstable_by(compare),
        );
    }

    let (left, right) = events.split_at(mid);
    let mut merged = Vec::with_capacity(events.len());
    merge_into(left, right, &mut merged, compare);
    *events = merged;
}

fn sort_four_way<T, F>(events: &mut Vec<T>, compare: &F)
where
    T: Copy + Send + Sync,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    let len = events.len();
    if len < 4 {
        events.sort_unstable_by(compare);
        return;
    }
    // The last quarter takes the remainder.
    let quarter = len / 4;
    let (b1, b2, b3) = (quarter, 2 * quarter, 3 * quarter);
    {
        let (low, high) = events.split_at_mut(b2);
        let (q0, q1) = low.split_at_mut(b1);
        let (q2, q3) = high.split_at_mut(b3 - b2);
        rayon::join(
            || {
                rayon::join(
                    || q0.sort_unstable_by(compare),
                    || q1.sort_unstable_by(compare),
                )
            },
            || {
                rayon::join(
                    || q2.sort_unstable_by(compare),
                    || q3.sort_unstable_by(compare),
                )
            },
        );
    }

    let (low, high) = {
        let (q0, rest) = events.split_at(b1);
        let (q1, rest) = rest.split_at(b2 - b1);
        let (q2, q3) = rest.split_at(b3 - b2);
        rayon::join(
            || merged_vec(q0, q1, compare),
            || merged_vec(q2, q3, compare),
        )
    };
    merge_into_slice(&low, &high, events.as_mut_slice(), compare);
}

fn merged_vec<T, F>(left: &[T], right: &[T], compare: &F) -> Vec<T>
where
    T: Copy,
    F: Fn(&T, &T) -> Ordering,
{
    let mut out = Vec::with_capacity(left.len() + right.len());
    merge_into(left, right, &mut out, compare);
    out
}

/// Appends the merge of two sorted runs to `out`.
fn merge_into<T, F>(left: &[T], right: &[T], out: &mut Vec<T>, compare: &F)
where
    T: Copy,
    F: Fn(&T, &T) -> Ordering,
{
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if compare(&right[j], &left[i]) == Ordering::Less {
            out.push(right[j]);
            j += 1;
        } else {
            out.push(left[i]);
            i += 1;
        }
    }
    out.extend_from_slice(&left[i..]);
    out.extend_from_slice(&right[j..]);
}

/// Writes the merge of two sorted runs over `out`, which must have exactly
/// `left.len() + right.len()` elements.
fn merge_into_slice<T, F>(left: &[T], right: &[T], out: &mut [T], compare: &F)
where
    T: Copy,
    F: Fn(&T, &T) -> Ordering,
{
    debug_assert_eq!(out.len(), left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    for slot in out.iter_mut() {
        let take_right = i == left.len()
            || (j < right.len() && compare(&right[j], &left[i]) == Ordering::Less);
        if take_right {
            *slot = right[j];
            j += 1;
        } else {
            *slot = left[i];
            i += 1;
        }
    }
}
