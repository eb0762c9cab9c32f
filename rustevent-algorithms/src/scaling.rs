//! Per-bin scaling of weighted events by a histogram.

use crate::histogram::range_tof;
use rustevent_core::{Error, Result, WeightedMut};

/// Operation applied to each event with its bin's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOperation {
    /// `w * y` with uncertainty propagation.
    Multiply,
    /// `w / y` with uncertainty propagation; a zero bin yields NaN weight.
    Divide,
}

/// Checks that X/Y/E describe one histogram.
///
/// # Errors
/// Returns [`Error::InvalidArgument`] unless `x.len() == y.len() + 1` and
/// `e.len() == y.len()`.
pub fn check_histogram_inputs(x: &[f64], y: &[f64], e: &[f64]) -> Result<()> {
    if x.len() != y.len() + 1 {
        return Err(Error::invalid_argument(format!(
            "histogram X has {} edges for {} values, expected {}",
            x.len(),
            y.len(),
            y.len() + 1
        )));
    }
    if e.len() != y.len() {
        return Err(Error::invalid_argument(format!(
            "histogram E has {} values, Y has {}",
            e.len(),
            y.len()
        )));
    }
    Ok(())
}

/// Scales TOF-sorted events by the value of the bin containing them.
///
/// Events below `x[0]` or at/above the last edge are left untouched. Inputs
/// must already have passed [`check_histogram_inputs`]. Events with a NaN
/// TOF are never scaled.
#[allow(clippy::float_cmp)]
pub fn scale_by_histogram<E: WeightedMut>(
    events: &mut [E],
    x: &[f64],
    y: &[f64],
    e: &[f64],
    operation: BinOperation,
) {
    let bins = y.len();
    if bins == 0 {
        return;
    }
    let range = range_tof(events, x[0], x[bins]);
    let mut bin = 0;
    for event in &mut events[range] {
        let tof = event.tof();
        while bin + 1 < bins && tof >= x[bin + 1] {
            bin += 1;
        }
        let (value, error) = (y[bin], e[bin]);
        match operation {
            BinOperation::Multiply => event.scale(value, error),
            BinOperation::Divide if value == 0.0 => event.set_weight(f64::NAN, 0.0),
            BinOperation::Divide => event.scale(1.0 / value, error / (value * value)),
        }
    }
}
