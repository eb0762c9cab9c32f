//! Event traits and types for time-of-flight data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Absolute pulse time in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PulseTime(pub i64);

impl PulseTime {
    /// Creates a pulse time from nanoseconds.
    #[inline]
    #[must_use]
    pub const fn from_nanoseconds(ns: i64) -> Self {
        Self(ns)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn as_nanoseconds(&self) -> i64 {
        self.0
    }

    /// Returns this time shifted by `ns` nanoseconds (saturating).
    #[inline]
    #[must_use]
    pub fn offset(&self, ns: i64) -> Self {
        Self(self.0.saturating_add(ns))
    }

    /// Computes the absolute time difference.
    #[inline]
    #[must_use]
    pub fn abs_diff(&self, other: &Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl From<i64> for PulseTime {
    fn from(ns: i64) -> Self {
        Self(ns)
    }
}

/// A plain neutron event: time-of-flight and the pulse it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TofEvent {
    /// Time-of-flight (microseconds).
    pub tof: f64,
    /// Pulse time of the originating pulse.
    pub pulse_time: PulseTime,
}

impl TofEvent {
    /// Creates a new plain event.
    #[inline]
    #[must_use]
    pub fn new(tof: f64, pulse_time: i64) -> Self {
        Self {
            tof,
            pulse_time: PulseTime(pulse_time),
        }
    }
}

/// An event carrying a weight and its squared uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightedEvent {
    /// Time-of-flight (microseconds).
    pub tof: f64,
    /// Pulse time of the originating pulse.
    pub pulse_time: PulseTime,
    /// Effective count (may be fractional or negative).
    pub weight: f64,
    /// Variance of the weight.
    pub error_squared: f64,
}

impl WeightedEvent {
    /// Creates a new weighted event.
    #[inline]
    #[must_use]
    pub fn new(tof: f64, pulse_time: i64, weight: f64, error_squared: f64) -> Self {
        Self {
            tof,
            pulse_time: PulseTime(pulse_time),
            weight,
            error_squared,
        }
    }

    /// Standard deviation of the weight.
    #[inline]
    #[must_use]
    pub fn error(&self) -> f64 {
        self.error_squared.sqrt()
    }
}

/// A weighted event without a pulse time.
///
/// Produced by compression or by degrading a weighted list. A list holding
/// these can never regain pulse times.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightedEventNoTime {
    /// Time-of-flight (microseconds).
    pub tof: f64,
    /// Effective count (may be fractional or negative).
    pub weight: f64,
    /// Variance of the weight.
    pub error_squared: f64,
}

impl WeightedEventNoTime {
    /// Creates a new weighted event without pulse time.
    #[inline]
    #[must_use]
    pub fn new(tof: f64, weight: f64, error_squared: f64) -> Self {
        Self {
            tof,
            weight,
            error_squared,
        }
    }

    /// Standard deviation of the weight.
    #[inline]
    #[must_use]
    pub fn error(&self) -> f64 {
        self.error_squared.sqrt()
    }
}

// A converted plain event has weight one and no uncertainty.
impl From<TofEvent> for WeightedEvent {
    #[inline]
    fn from(event: TofEvent) -> Self {
        Self {
            tof: event.tof,
            pulse_time: event.pulse_time,
            weight: 1.0,
            error_squared: 0.0,
        }
    }
}

impl From<TofEvent> for WeightedEventNoTime {
    #[inline]
    fn from(event: TofEvent) -> Self {
        Self {
            tof: event.tof,
            weight: 1.0,
            error_squared: 0.0,
        }
    }
}

impl From<WeightedEvent> for WeightedEventNoTime {
    #[inline]
    fn from(event: WeightedEvent) -> Self {
        Self {
            tof: event.tof,
            weight: event.weight,
            error_squared: event.error_squared,
        }
    }
}

/// Trait shared by every event representation.
///
/// Kernels in `rustevent-algorithms` are generic over this trait so the same
/// scan serves all three representations.
pub trait Event: Copy + Send + Sync {
    /// Returns the time-of-flight.
    fn tof(&self) -> f64;

    /// Replaces the time-of-flight.
    fn set_tof(&mut self, tof: f64);

    /// Returns the weight (1 for plain events).
    fn weight(&self) -> f64;

    /// Returns the squared uncertainty (1 for plain events).
    fn error_squared(&self) -> f64;

    /// Applies `tof * factor + offset`.
    #[inline]
    fn convert_tof(&mut self, factor: f64, offset: f64) {
        self.set_tof(self.tof() * factor + offset);
    }
}

/// Events that carry a pulse time.
pub trait TimedEvent: Event {
    /// Returns the pulse time.
    fn pulse_time(&self) -> PulseTime;

    /// Replaces the pulse time.
    fn set_pulse_time(&mut self, pulse_time: PulseTime);
}

/// Events whose weight can be rewritten.
pub trait WeightedMut: Event {
    /// Replaces weight and squared uncertainty.
    fn set_weight(&mut self, weight: f64, error_squared: f64);

    /// Scales by `value ± error`, propagating the uncertainty.
    ///
    /// `e2' = e2 * value² + error² * w²`, `w' = w * value`.
    #[inline]
    fn scale(&mut self, value: f64, error: f64) {
        let weight = self.weight();
        let error_squared =
            self.error_squared() * value * value + error * error * weight * weight;
        self.set_weight(weight * value, error_squared);
    }
}

impl Event for TofEvent {
    #[inline]
    fn tof(&self) -> f64 {
        self.tof
    }

    #[inline]
    fn set_tof(&mut self, tof: f64) {
        self.tof = tof;
    }

    #[inline]
    fn weight(&self) -> f64 {
        1.0
    }

    #[inline]
    fn error_squared(&self) -> f64 {
        1.0
    }
}

impl TimedEvent for TofEvent {
    #[inline]
    fn pulse_time(&self) -> PulseTime {
        self.pulse_time
    }

    #[inline]
    fn set_pulse_time(&mut self, pulse_time: PulseTime) {
        self.pulse_time = pulse_time;
    }
}

impl Event for WeightedEvent {
    #[inline]
    fn tof(&self) -> f64 {
        self.tof
    }

    #[inline]
    fn set_tof(&mut self, tof: f64) {
        self.tof = tof;
    }

    #[inline]
    fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    fn error_squared(&self) -> f64 {
        self.error_squared
    }
}

impl TimedEvent for WeightedEvent {
    #[inline]
    fn pulse_time(&self) -> PulseTime {
        self.pulse_time
    }

    #[inline]
    fn set_pulse_time(&mut self, pulse_time: PulseTime) {
        self.pulse_time = pulse_time;
    }
}

impl WeightedMut for WeightedEvent {
    #[inline]
    fn set_weight(&mut self, weight: f64, error_squared: f64) {
        self.weight = weight;
        self.error_squared = error_squared;
    }
}

impl Event for WeightedEventNoTime {
    #[inline]
    fn tof(&self) -> f64 {
        self.tof
    }

    #[inline]
    fn set_tof(&mut self, tof: f64) {
        self.tof = tof;
    }

    #[inline]
    fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    fn error_squared(&self) -> f64 {
        self.error_squared
    }
}

impl WeightedMut for WeightedEventNoTime {
    #[inline]
    fn set_weight(&mut self, weight: f64, error_squared: f64) {
        self.weight = weight;
        self.error_squared = error_squared;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pulse_time_offset() {
        let t = PulseTime::from_nanoseconds(1_000);
        assert_eq!(t.offset(500).as_nanoseconds(), 1_500);
        assert_eq!(t.offset(-2_000).as_nanoseconds(), -1_000);
        assert_eq!(PulseTime(i64::MAX).offset(1), PulseTime(i64::MAX));
        assert_eq!(t.abs_diff(&PulseTime(400)), 600);
    }

    #[test]
    fn test_plain_to_weighted_conversion() {
        let plain = TofEvent::new(123.5, 42);
        let weighted = WeightedEvent::from(plain);
        assert_relative_eq!(weighted.tof, 123.5);
        assert_eq!(weighted.pulse_time, PulseTime(42));
        assert_relative_eq!(weighted.weight, 1.0);
        assert_relative_eq!(weighted.error_squared, 0.0);

        let no_time = WeightedEventNoTime::from(plain);
        assert_relative_eq!(no_time.weight, 1.0);
        assert_relative_eq!(no_time.error_squared, 0.0);
        // The plain event itself still histograms with Poisson variance.
        assert_relative_eq!(plain.error_squared(), 1.0);
    }

    #[test]
    fn test_weighted_degrades_to_no_time() {
        let weighted = WeightedEvent::new(10.0, 99, 2.5, 0.25);
        let degraded = WeightedEventNoTime::from(weighted);
        assert_relative_eq!(degraded.tof, 10.0);
        assert_relative_eq!(degraded.weight, 2.5);
        assert_relative_eq!(degraded.error(), 0.5);
    }

    #[test]
    fn test_scale_propagates_uncertainty() {
        let mut event = WeightedEvent::new(1.0, 0, 2.0, 1.0);
        event.scale(2.0, 0.0);
        assert_relative_eq!(event.weight, 4.0);
        assert_relative_eq!(event.error_squared, 4.0);

        let mut event = WeightedEventNoTime::new(1.0, 3.0, 4.0);
        event.scale(2.0, 0.5);
        // 4 * 2² + 0.5² * 3²
        assert_relative_eq!(event.error_squared, 18.25);
        assert_relative_eq!(event.weight, 6.0);
    }

    #[test]
    fn test_convert_tof() {
        let mut event = TofEvent::new(100.0, 0);
        event.convert_tof(2.0, 5.0);
        assert_relative_eq!(event.tof(), 205.0);
        assert_relative_eq!(event.weight(), 1.0);
    }
}
