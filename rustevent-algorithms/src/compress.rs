//! Tolerance-based compression of TOF-sorted events.

use rustevent_core::{Event, WeightedEventNoTime};

/// Running state of the group being built.
struct Group {
    anchor: f64,
    tof_sum: f64,
    count: usize,
    weight: f64,
    error_squared: f64,
}

impl Group {
    fn start<E: Event>(event: &E) -> Self {
        Self {
            anchor: event.tof(),
            tof_sum: event.tof(),
            count: 1,
            weight: event.weight(),
            error_squared: event.error_squared(),
        }
    }

    fn add<E: Event>(&mut self, event: &E) {
        self.tof_sum += event.tof();
        self.count += 1;
        self.weight += event.weight();
        self.error_squared += event.error_squared();
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(&self) -> WeightedEventNoTime {
        WeightedEventNoTime::new(
            self.tof_sum / self.count as f64,
            self.weight,
            self.error_squared,
        )
    }
}

/// Merges runs of TOF-sorted events into single weighted events.
///
/// Grouping is greedy and left-anchored: an event joins the current group
/// when `tof - anchor <= tolerance`, where the anchor is the first event of
/// the group. Each group becomes one event with the mean TOF, the summed
/// weight and the summed squared uncertainty. `out` is cleared first.
pub fn compress_events<E: Event>(
    events: &[E],
    tolerance: f64,
    out: &mut Vec<WeightedEventNoTime>,
) {
    out.clear();
    let mut iter = events.iter();
    let Some(first) = iter.next() else {
        return;
    };

    let mut group = Group::start(first);
    for event in iter {
        if event.tof() - group.anchor <= tolerance {
            group.add(event);
        } else {
            out.push(group.finish());
            group = Group::start(event);
        }
    }
    out.push(group.finish());
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustevent_core::{TofEvent, WeightedEvent};

    #[test]
    fn test_near_identical_tofs_merge() {
        let events = vec![
            TofEvent::new(5.0, 0),
            TofEvent::new(5.000_000_5, 1),
            TofEvent::new(9.0, 2),
        ];
        let mut out = Vec::new();
        compress_events(&events, 0.001, &mut out);
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].tof, 5.000_000_25, epsilon = 1e-12);
        assert_relative_eq!(out[0].weight, 2.0);
        assert_relative_eq!(out[0].error_squared, 2.0);
        assert_relative_eq!(out[1].tof, 9.0);
        assert_relative_eq!(out[1].weight, 1.0);
    }

    #[test]
    fn test_difference_equal_to_tolerance_merges() {
        let events = vec![TofEvent::new(1.0, 0), TofEvent::new(1.5, 0)];
        let mut out = Vec::new();
        compress_events(&events, 0.5, &mut out);
        assert_eq!(out.len(), 1);

        let events = vec![TofEvent::new(1.0, 0), TofEvent::new(1.625, 0)];
        compress_events(&events, 0.5, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_group_is_anchored_on_first_event() {
        // Each step is within tolerance of its predecessor, but 2.0 is more
        // than 1.0 away from the anchor at 0.0.
        let events: Vec<TofEvent> = [0.0, 0.5, 1.0, 1.5, 2.0]
            .iter()
            .map(|&t| TofEvent::new(t, 0))
            .collect();
        let mut out = Vec::new();
        compress_events(&events, 1.0, &mut out);
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].tof, 0.5);
        assert_relative_eq!(out[0].weight, 3.0);
        assert_relative_eq!(out[1].tof, 1.75);
        assert_relative_eq!(out[1].weight, 2.0);
    }

    #[test]
    fn test_weights_are_summed() {
        let events = vec![
            WeightedEvent::new(1.0, 0, 2.0, 0.5),
            WeightedEvent::new(1.1, 0, -0.5, 0.25),
        ];
        let mut out = vec![WeightedEventNoTime::new(0.0, 0.0, 0.0)];
        compress_events(&events, 0.2, &mut out);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].weight, 1.5);
        assert_relative_eq!(out[0].error_squared, 0.75);
    }

    #[test]
    fn test_empty_input() {
        let events: Vec<TofEvent> = Vec::new();
        let mut out = vec![WeightedEventNoTime::new(0.0, 1.0, 1.0)];
        compress_events(&events, 1.0, &mut out);
        assert!(out.is_empty());
    }
}
