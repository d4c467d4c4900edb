//! Arrival time extraction
//!
//! The arrival of an impact at a corner sensor is the first instant its
//! rectified window reaches a fixed fraction of that window's own peak.
//! Normalizing per channel makes the pick insensitive to coupling differences
//! between sensors.

use footfall_core::math::{crossing_fraction, finite_or_zero, peak_abs};

/// Arrival of the wavefront on one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrivalTime {
    /// Arrival in fractional samples from the window start
    pub samples: f64,
    /// Whether any sample reached the arrival threshold
    pub detected: bool,
}

/// Locate the arrival on a single window.
///
/// Threshold is `fraction × peak(|window|)`. The first sample reaching it is
/// refined by linear interpolation against the previous sample. A silent
/// window (zero peak) reports the window length, i.e. maximally late.
#[must_use]
pub fn time_of_arrival(window: &[f64], fraction: f64) -> ArrivalTime {
    #[allow(clippy::cast_precision_loss)]
    let late = ArrivalTime { samples: window.len() as f64, detected: false };

    let peak = peak_abs(window);
    if peak <= 0.0 {
        return late;
    }
    let threshold = fraction * peak;

    let Some(index) = window
        .iter()
        .position(|&v| finite_or_zero(v).abs() >= threshold)
    else {
        return late;
    };

    #[allow(clippy::cast_precision_loss)]
    let samples = if index == 0 {
        0.0
    } else {
        let before = finite_or_zero(window[index - 1]).abs();
        let after = finite_or_zero(window[index]).abs();
        (index - 1) as f64 + crossing_fraction(before, after, threshold)
    };

    ArrivalTime { samples, detected: true }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolated_crossing() {
        // Peak 1.0, threshold 0.15: crosses between 0.1 (index 2) and 0.2 (index 3)
        let window = [0.0, 0.05, 0.1, 0.2, 1.0, 0.5];
        let arrival = time_of_arrival(&window, 0.15);
        assert!(arrival.detected);
        assert!((arrival.samples - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_negative_polarity() {
        let window = [0.0, 0.0, -0.5, -2.0];
        let arrival = time_of_arrival(&window, 0.25);
        assert!((arrival.samples - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_crossing_at_start() {
        let arrival = time_of_arrival(&[3.0, 1.0, 0.0], 0.15);
        assert!(arrival.detected);
        assert!(arrival.samples.abs() < 1e-12);
    }

    #[test]
    fn test_silent_window_is_late() {
        let arrival = time_of_arrival(&[0.0; 64], 0.15);
        assert!(!arrival.detected);
        assert!((arrival.samples - 64.0).abs() < 1e-12);

        let arrival = time_of_arrival(&[], 0.15);
        assert!(!arrival.detected);
        assert!(arrival.samples.abs() < 1e-12);
    }

    #[test]
    fn test_nan_samples_ignored() {
        let window = [f64::NAN, 0.0, 1.0];
        let arrival = time_of_arrival(&window, 0.5);
        assert!((arrival.samples - 1.5).abs() < 1e-12);
    }
}
