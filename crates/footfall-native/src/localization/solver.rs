//! Grid-search TDOA multilateration
//!
//! Every grid point on the surface is scored by the squared difference between
//! the relative delays it would produce and the observed ones. The search is
//! exhaustive, so identical input always yields the identical grid point.
//! With the `parallel` feature the scoring is split across a rayon pool; the
//! winner is chosen with the same total order either way.

use std::cmp::Ordering;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use footfall_core::types::{Sensor, SurfaceLayout};

/// Upper bound of the confidence scale
pub const MAX_CONFIDENCE: f64 = 10.0;

/// Confidence lost per ms² of residual
const CONFIDENCE_SLOPE: f64 = 5.0;

/// Map a residual (ms²) to a confidence in `[0, 10]`.
///
/// Monotonically non-increasing; non-finite residuals map to zero.
#[must_use]
pub fn confidence_from_residual(residual: f64) -> f64 {
    if !residual.is_finite() {
        return 0.0;
    }
    (MAX_CONFIDENCE - residual * CONFIDENCE_SLOPE).clamp(0.0, MAX_CONFIDENCE)
}

/// Best grid point for a set of observed delays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSolution {
    /// X position (cm)
    pub x_cm: f64,
    /// Y position (cm)
    pub y_cm: f64,
    /// Sum of squared delay errors at this point (ms²)
    pub residual: f64,
}

/// Exhaustive multilateration over a rectangular grid.
#[derive(Clone, Debug)]
pub struct GridSolver {
    sensors: [Sensor; 4],
    /// Points per axis
    columns: usize,
    rows: usize,
    resolution_cm: f64,
    /// Milliseconds per centimetre of path
    ms_per_cm: f64,
}

impl GridSolver {
    /// Build a solver for a validated surface, resolution and wave speed.
    #[must_use]
    pub fn new(surface: &SurfaceLayout, resolution_cm: f64, wave_speed_cm_s: f64) -> Self {
        Self {
            sensors: surface.sensors(),
            columns: axis_points(surface.width_cm, resolution_cm),
            rows: axis_points(surface.height_cm, resolution_cm),
            resolution_cm,
            ms_per_cm: 1000.0 / wave_speed_cm_s,
        }
    }

    /// Total grid points evaluated per solve
    #[must_use]
    pub fn grid_points(&self) -> usize {
        self.columns.saturating_mul(self.rows)
    }

    /// Relative delays (ms) an impact at `(x, y)` would produce.
    #[must_use]
    pub fn expected_delays(&self, x_cm: f64, y_cm: f64) -> [f64; 4] {
        let arrivals = self.sensors.map(|s| s.distance_to(x_cm, y_cm) * self.ms_per_cm);
        relative(arrivals)
    }

    fn point(&self, index: usize) -> (f64, f64) {
        #[allow(clippy::cast_precision_loss)]
        let x = (index % self.columns) as f64 * self.resolution_cm;
        #[allow(clippy::cast_precision_loss)]
        let y = (index / self.columns) as f64 * self.resolution_cm;
        (x, y)
    }

    fn residual_at(&self, index: usize, observed_ms: &[f64; 4]) -> f64 {
        let (x, y) = self.point(index);
        self.expected_delays(x, y)
            .iter()
            .zip(observed_ms)
            .map(|(e, o)| (e - o) * (e - o))
            .sum()
    }

    /// Find the grid point whose expected delays best match `observed_ms`.
    ///
    /// `observed_ms` must already be relative (minimum zero).
    #[must_use]
    pub fn solve(&self, observed_ms: &[f64; 4]) -> GridSolution {
        let best = self.search(observed_ms);
        let (x_cm, y_cm) = self.point(best.0);
        GridSolution { x_cm, y_cm, residual: best.1 }
    }

    #[cfg(feature = "parallel")]
    fn search(&self, observed_ms: &[f64; 4]) -> (usize, f64) {
        (0..self.grid_points())
            .into_par_iter()
            .map(|index| (index, self.residual_at(index, observed_ms)))
            .min_by(rank)
            .unwrap_or((0, f64::INFINITY))
    }

    #[cfg(not(feature = "parallel"))]
    fn search(&self, observed_ms: &[f64; 4]) -> (usize, f64) {
        (0..self.grid_points())
            .map(|index| (index, self.residual_at(index, observed_ms)))
            .min_by(rank)
            .unwrap_or((0, f64::INFINITY))
    }
}

/// Lower residual wins; ties go to the lower grid index.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn rank(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

/// Grid points along an axis of `length` at `step` spacing, both ends included
/// when the length divides evenly.
fn axis_points(length: f64, step: f64) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let intervals = (length / step + 1e-9).floor() as usize;
    intervals.saturating_add(1)
}

/// Subtract the earliest value from each entry.
#[must_use]
pub(crate) fn relative(values: [f64; 4]) -> [f64; 4] {
    let earliest = values.iter().copied().fold(f64::INFINITY, f64::min);
    values.map(|v| v - earliest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver(resolution: f64) -> GridSolver {
        GridSolver::new(&SurfaceLayout::default(), resolution, 30_000.0)
    }

    #[test]
    fn test_grid_size() {
        assert_eq!(solver(1.0).grid_points(), 101 * 101);
        assert_eq!(solver(5.0).grid_points(), 21 * 21);
        // 100 / 3 leaves a partial step at the far edge
        assert_eq!(solver(3.0).grid_points(), 34 * 34);
    }

    #[test]
    fn test_degenerate_resolution_saturates() {
        assert_eq!(axis_points(100.0, 1e-300), usize::MAX);
        assert_eq!(solver(1e-300).grid_points(), usize::MAX);
    }

    #[test]
    fn test_center_has_zero_delays() {
        let delays = solver(1.0).expected_delays(50.0, 50.0);
        assert!(delays.iter().all(|d| d.abs() < 1e-12));

        let solution = solver(1.0).solve(&[0.0; 4]);
        assert!((solution.x_cm - 50.0).abs() < 1e-9);
        assert!((solution.y_cm - 50.0).abs() < 1e-9);
        assert!(solution.residual < 1e-12);
    }

    #[test]
    fn test_recovers_grid_point_from_exact_delays() {
        let solver = solver(1.0);
        for &(x, y) in &[(20.0, 30.0), (75.0, 10.0), (5.0, 90.0), (100.0, 0.0)] {
            let observed = solver.expected_delays(x, y);
            let solution = solver.solve(&observed);
            assert!((solution.x_cm - x).abs() <= 1.0, "x {} vs {x}", solution.x_cm);
            assert!((solution.y_cm - y).abs() <= 1.0, "y {} vs {y}", solution.y_cm);
            assert!(solution.residual < 1e-12);
        }
    }

    #[test]
    fn test_deterministic() {
        let solver = solver(2.0);
        let observed = [0.3, 0.0, 1.1, 0.7];
        assert_eq!(solver.solve(&observed), solver.solve(&observed));
    }

    #[test]
    fn test_confidence_mapping() {
        assert!((confidence_from_residual(0.0) - 10.0).abs() < 1e-12);
        assert!((confidence_from_residual(1.0) - 5.0).abs() < 1e-12);
        assert!(confidence_from_residual(2.0).abs() < 1e-12);
        assert!(confidence_from_residual(100.0).abs() < 1e-12);
        assert!(confidence_from_residual(f64::NAN).abs() < 1e-12);

        let mut previous = MAX_CONFIDENCE;
        for step in 0..50 {
            let c = confidence_from_residual(f64::from(step) * 0.05);
            assert!(c <= previous);
            previous = c;
        }
    }

    #[test]
    fn test_relative_delays() {
        let rel = relative([3.0, 1.5, 2.0, 1.5]);
        assert_eq!(rel, [1.5, 0.0, 0.5, 0.0]);
    }
}
