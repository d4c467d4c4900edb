//! Math utilities for vibration signal processing (`no_std` compatible)
//!
//! This module provides:
//! - An adaptive mean that seeds as a cumulative average and then tracks as an EMA
//! - Median and mean over float slices
//! - Sub-sample threshold-crossing interpolation

use serde::{Deserialize, Serialize};

// ============================================================================
// Adaptive Mean
// ============================================================================

/// First-order IIR tracker with a seeding phase.
///
/// While seeding, the value is the plain cumulative mean of every input so a
/// short warmup converges regardless of `alpha`. Afterwards it follows
/// y[n] = α * x[n] + (1-α) * y[n-1].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveMean {
    alpha: f64,
    value: f64,
    count: u64,
}

impl AdaptiveMean {
    /// Create a tracker with the given EMA coefficient (0 < α ≤ 1).
    #[must_use]
    pub const fn new(alpha: f64) -> Self {
        Self { alpha, value: 0.0, count: 0 }
    }

    /// Fold a sample into the cumulative mean.
    #[inline]
    pub fn seed(&mut self, x: f64) {
        self.count += 1;
        #[allow(clippy::cast_precision_loss)]
        let n = self.count as f64;
        self.value += (x - self.value) / n;
    }

    /// Fold a sample into the exponential average.
    ///
    /// The first sample ever seen initialises the average directly.
    #[inline]
    pub fn update(&mut self, x: f64) {
        if self.count == 0 {
            self.value = x;
        } else {
            self.value += self.alpha * (x - self.value);
        }
        self.count = self.count.saturating_add(1);
    }

    /// Current estimate
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Number of samples folded in since the last reset
    #[inline]
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Reset to an empty state.
    #[inline]
    pub fn reset(&mut self) {
        self.value = 0.0;
        self.count = 0;
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Replace NaN and infinities with zero.
#[inline]
#[must_use]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Arithmetic mean; zero for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

/// Median of a slice, sorting it in place; zero for an empty slice.
#[must_use]
pub fn median_in_place(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Largest absolute value in a slice, skipping non-finite entries.
#[must_use]
pub fn peak_abs(values: &[f64]) -> f64 {
    values
        .iter()
        .map(|&v| finite_or_zero(v).abs())
        .fold(0.0, f64::max)
}

// ============================================================================
// Interpolation
// ============================================================================

/// Fractional position in `[0, 1]` at which a straight line from `before` to
/// `after` reaches `threshold`.
///
/// Returns 1.0 when the segment is flat, i.e. the crossing is attributed to
/// the later sample.
#[inline]
#[must_use]
pub fn crossing_fraction(before: f64, after: f64, threshold: f64) -> f64 {
    let rise = after - before;
    if rise.abs() <= f64::EPSILON {
        return 1.0;
    }
    ((threshold - before) / rise).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_mean_seed_is_cumulative() {
        let mut m = AdaptiveMean::new(0.01);
        for x in [1.0, 2.0, 3.0, 4.0] {
            m.seed(x);
        }
        assert!((m.value() - 2.5).abs() < 1e-12);
        assert_eq!(m.count(), 4);
    }

    #[test]
    fn test_adaptive_mean_ema() {
        let mut m = AdaptiveMean::new(0.5);
        m.update(10.0);
        assert!((m.value() - 10.0).abs() < 1e-12);
        m.update(0.0);
        assert!((m.value() - 5.0).abs() < 1e-12);

        m.reset();
        assert_eq!(m.count(), 0);
        assert!(m.value().abs() < 1e-12);
    }

    #[test]
    fn test_median() {
        let mut odd = [5.0, 1.0, 3.0];
        assert!((median_in_place(&mut odd) - 3.0).abs() < 1e-12);

        let mut even = [4.0, 1.0, 3.0, 2.0];
        assert!((median_in_place(&mut even) - 2.5).abs() < 1e-12);

        assert!(median_in_place(&mut []).abs() < 1e-12);
    }

    #[test]
    fn test_peak_abs_skips_nan() {
        assert!((peak_abs(&[0.5, -2.0, f64::NAN, 1.0]) - 2.0).abs() < 1e-12);
        assert!(peak_abs(&[]).abs() < 1e-12);
    }

    #[test]
    fn test_crossing_fraction() {
        assert!((crossing_fraction(0.0, 1.0, 0.25) - 0.25).abs() < 1e-12);
        assert!((crossing_fraction(0.2, 0.2, 0.2) - 1.0).abs() < 1e-12);
        assert!((crossing_fraction(0.0, 1.0, 2.0) - 1.0).abs() < 1e-12);
    }
}
