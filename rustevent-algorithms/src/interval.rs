//! Pulse-time interval kernels over events sorted by pulse time.

use rustevent_core::{PulseTime, TimeSplitter, TimedEvent};

/// The contiguous run of pulse-time-sorted events with `start <= t < stop`.
pub fn pulse_time_range<E: TimedEvent>(
    events: &[E],
    start: PulseTime,
    stop: PulseTime,
) -> &[E] {
    let low = events.partition_point(|e| e.pulse_time() < start);
    let high = events.partition_point(|e| e.pulse_time() < stop).max(low);
    &events[low..high]
}

/// Keeps only events that fall inside an interval with a non-negative index.
///
/// Single forward co-scan of intervals and pulse-time-sorted events. Kept
/// events are compacted towards the front in their original order and the
/// vector is truncated to the kept count.
pub fn retain_in_intervals<E: TimedEvent>(events: &mut Vec<E>, splitter: &TimeSplitter) {
    let intervals = splitter.intervals();
    let mut cursor = 0;
    events.retain(|event| {
        let t = event.pulse_time();
        while cursor < intervals.len() && t >= intervals[cursor].stop {
            cursor += 1;
        }
        intervals
            .get(cursor)
            .is_some_and(|interval| t >= interval.start && interval.is_kept())
    });
}

/// Yields `(index, events)` for every interval, in interval order.
pub fn interval_slices<'a, E: TimedEvent>(
    events: &'a [E],
    splitter: &'a TimeSplitter,
) -> impl Iterator<Item = (i32, &'a [E])> + 'a {
    splitter.iter().map(move |interval| {
        let slice = pulse_time_range(events, interval.start, interval.stop);
        (interval.index, slice)
    })
}
