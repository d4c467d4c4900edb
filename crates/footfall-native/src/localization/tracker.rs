//! Stateful footstep position tracker
//!
//! One tracker per monitored surface. Each call extracts per-corner arrival
//! times, solves for the best grid point and folds it into an exponential
//! moving average, but only when the fit is trustworthy. Tunables can be
//! changed between calls without losing the smoothed position.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use footfall_core::config::TrackerConfig;
use footfall_core::error::ConfigError;
use footfall_core::types::{CalibrationPoint, SurfaceLayout};

use super::arrival::time_of_arrival;
use super::solver::{confidence_from_residual, relative, GridSolver};

/// One localization result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionEstimate {
    /// Smoothed X position (cm)
    pub x_cm: f64,
    /// Smoothed Y position (cm)
    pub y_cm: f64,
    /// Unsmoothed grid solution X (cm)
    pub raw_x_cm: f64,
    /// Unsmoothed grid solution Y (cm)
    pub raw_y_cm: f64,
    /// Fit quality in `[0, 10]`
    pub confidence: f64,
    /// Squared delay error of the grid solution (ms²)
    pub residual: f64,
    /// Per-corner arrival from the window start (ms), in corner order
    pub arrival_ms: [f64; 4],
    /// Per-corner arrival relative to the earliest corner (ms)
    pub delays_ms: [f64; 4],
    /// Whether this result moved the smoothed position
    pub accepted: bool,
    /// Localizations performed by this tracker, starting at 1
    pub sequence: u64,
    /// Caller-supplied or wall-clock time of the estimate (µs)
    pub timestamp_us: u64,
}

/// TDOA position tracker with confidence-gated EMA smoothing.
#[derive(Clone, Debug)]
pub struct PositionTracker {
    surface: SurfaceLayout,
    config: TrackerConfig,
    solver: GridSolver,
    smoothed: Option<(f64, f64)>,
    calibration: Vec<CalibrationPoint>,
    sequence: u64,
}

impl PositionTracker {
    /// Create a tracker for a surface.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the surface or tunables are invalid.
    pub fn new(surface: SurfaceLayout, config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate_for(&surface)?;
        Ok(Self {
            surface,
            config,
            solver: build_solver(&surface, &config),
            smoothed: None,
            calibration: Vec::new(),
            sequence: 0,
        })
    }

    /// Localize an impact from four time-aligned corner windows, stamped with
    /// the wall clock.
    ///
    /// Returns `None` when fewer than four windows are supplied. Extra windows
    /// beyond the fourth are ignored.
    pub fn calculate_position<W: AsRef<[f64]>>(&mut self, windows: &[W]) -> Option<PositionEstimate> {
        self.calculate_position_at(windows, wall_clock_us())
    }

    /// Localize an impact with an explicit timestamp.
    pub fn calculate_position_at<W: AsRef<[f64]>>(
        &mut self,
        windows: &[W],
        timestamp_us: u64,
    ) -> Option<PositionEstimate> {
        if windows.len() < 4 {
            debug!(windows = windows.len(), "Localization skipped: need four windows");
            return None;
        }

        let arrivals: [_; 4] = std::array::from_fn(|i| {
            time_of_arrival(windows[i].as_ref(), self.config.arrival_threshold)
        });
        let ms_per_sample = 1000.0 / self.config.sample_rate_hz;
        let arrival_ms = arrivals.map(|a| a.samples * ms_per_sample);
        let delays_ms = relative(arrival_ms);
        self.sequence += 1;

        if arrivals.iter().all(|a| !a.detected) {
            warn!(sequence = self.sequence, "No corner reached the arrival threshold");
            let (raw_x_cm, raw_y_cm) = self.surface.center();
            let (x_cm, y_cm) = self.smoothed.unwrap_or((raw_x_cm, raw_y_cm));
            return Some(PositionEstimate {
                x_cm,
                y_cm,
                raw_x_cm,
                raw_y_cm,
                confidence: 0.0,
                residual: f64::INFINITY,
                arrival_ms,
                delays_ms,
                accepted: false,
                sequence: self.sequence,
                timestamp_us,
            });
        }

        let solution = self.solver.solve(&delays_ms);
        let confidence = confidence_from_residual(solution.residual);
        let accepted = confidence > self.config.confidence_gate;
        if accepted {
            let w = self.config.smoothing;
            self.smoothed = Some(match self.smoothed {
                None => (solution.x_cm, solution.y_cm),
                Some((x, y)) => (x + w * (solution.x_cm - x), y + w * (solution.y_cm - y)),
            });
        }
        let (x_cm, y_cm) = self.smoothed.unwrap_or_else(|| self.surface.center());

        debug!(
            sequence = self.sequence,
            raw_x = solution.x_cm,
            raw_y = solution.y_cm,
            x = x_cm,
            y = y_cm,
            confidence,
            residual = solution.residual,
            accepted,
            "Footstep localized"
        );

        Some(PositionEstimate {
            x_cm,
            y_cm,
            raw_x_cm: solution.x_cm,
            raw_y_cm: solution.y_cm,
            confidence,
            residual: solution.residual,
            arrival_ms,
            delays_ms,
            accepted,
            sequence: self.sequence,
            timestamp_us,
        })
    }

    // ========================================================================
    // Live reconfiguration
    // ========================================================================

    /// Validate a candidate configuration and swap it in, keeping the
    /// smoothed position.
    fn reconfigure(&mut self, candidate: TrackerConfig, what: &str) -> Result<(), ConfigError> {
        candidate.validate_for(&self.surface)?;
        self.config = candidate;
        self.solver = build_solver(&self.surface, &self.config);
        info!(parameter = what, "Tracker reconfigured");
        Ok(())
    }

    /// Set the arrival threshold as a fraction of each channel's peak.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` unless `0 < fraction ≤ 1`.
    pub fn set_threshold(&mut self, fraction: f64) -> Result<(), ConfigError> {
        self.reconfigure(TrackerConfig { arrival_threshold: fraction, ..self.config }, "arrival_threshold")
    }

    /// Set the wave propagation speed (cm/s).
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the speed is not positive.
    pub fn set_wave_speed(&mut self, cm_per_s: f64) -> Result<(), ConfigError> {
        self.reconfigure(TrackerConfig { wave_speed_cm_s: cm_per_s, ..self.config }, "wave_speed_cm_s")
    }

    /// Set the reserved sharpening exponent. Stored only.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the exponent is negative or not finite.
    pub fn set_sharpening(&mut self, exponent: f64) -> Result<(), ConfigError> {
        self.reconfigure(TrackerConfig { sharpening: exponent, ..self.config }, "sharpening")
    }

    /// Set the grid spacing (cm).
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the spacing is below
    /// [`TrackerConfig::MIN_GRID_RESOLUTION_CM`] or the grid over the current
    /// surface would exceed [`TrackerConfig::MAX_GRID_POINTS`].
    pub fn set_grid_resolution(&mut self, cm: f64) -> Result<(), ConfigError> {
        self.reconfigure(TrackerConfig { grid_resolution_cm: cm, ..self.config }, "grid_resolution_cm")
    }

    /// Set the EMA weight of the newest accepted estimate.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` unless `0 < weight ≤ 1`.
    pub fn set_smoothing(&mut self, weight: f64) -> Result<(), ConfigError> {
        self.reconfigure(TrackerConfig { smoothing: weight, ..self.config }, "smoothing")
    }

    /// Set the confidence an estimate must exceed to be smoothed in.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` unless the gate lies in `[0, 10]`.
    pub fn set_confidence_gate(&mut self, gate: f64) -> Result<(), ConfigError> {
        self.reconfigure(TrackerConfig { confidence_gate: gate, ..self.config }, "confidence_gate")
    }

    /// Replace the calibration marks. The solver does not read them.
    pub fn set_calibration_data(&mut self, points: Vec<CalibrationPoint>) {
        info!(points = points.len(), "Calibration data replaced");
        self.calibration = points;
    }

    /// Resize the surface. The smoothed position is clamped into the new bounds.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if either dimension is not positive or the
    /// resized grid would be too large for the current resolution.
    pub fn set_surface(&mut self, surface: SurfaceLayout) -> Result<(), ConfigError> {
        self.config.validate_for(&surface)?;
        self.surface = surface;
        self.solver = build_solver(&self.surface, &self.config);
        self.smoothed = self.smoothed.map(|(x, y)| surface.clamp(x, y));
        info!(width_cm = surface.width_cm, height_cm = surface.height_cm, "Surface resized");
        Ok(())
    }

    /// Forget the smoothed position; the next accepted estimate seeds it.
    pub fn reset_smoothing(&mut self) {
        self.smoothed = None;
        info!("Tracker smoothing reset");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current smoothed position, if any estimate has been accepted
    #[must_use]
    pub fn smoothed(&self) -> Option<(f64, f64)> {
        self.smoothed
    }

    /// Calibration marks as last supplied
    #[must_use]
    pub fn calibration_points(&self) -> &[CalibrationPoint] {
        &self.calibration
    }

    /// Active tunables
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Monitored surface
    #[must_use]
    pub fn surface(&self) -> &SurfaceLayout {
        &self.surface
    }
}

fn build_solver(surface: &SurfaceLayout, config: &TrackerConfig) -> GridSolver {
    GridSolver::new(surface, config.grid_resolution_cm, config.wave_speed_cm_s)
}

fn wall_clock_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEN: usize = 200;
    const LEAD: f64 = 20.0;

    fn tracker() -> PositionTracker {
        PositionTracker::new(SurfaceLayout::default(), TrackerConfig::default()).unwrap()
    }

    /// Linear ramp to 1.0 starting at `onset` samples
    fn ramp(onset: f64) -> Vec<f64> {
        (0..LEN)
            .map(|i| ((i as f64 - onset) * 0.05).clamp(0.0, 1.0))
            .collect()
    }

    /// Corner windows for an impact at `(x, y)` on the default surface
    fn impact(x: f64, y: f64) -> Vec<Vec<f64>> {
        let config = TrackerConfig::default();
        SurfaceLayout::default()
            .sensors()
            .iter()
            .map(|s| {
                let delay = s.distance_to(x, y) / config.wave_speed_cm_s * config.sample_rate_hz;
                ramp(LEAD + delay)
            })
            .collect()
    }

    /// Delays no point on the surface can produce
    fn inconsistent() -> Vec<Vec<f64>> {
        vec![ramp(LEAD), ramp(LEAD + 30.0), ramp(LEAD + 30.0), ramp(LEAD)]
    }

    #[test]
    fn test_fewer_than_four_windows() {
        let mut tracker = tracker();
        let windows = impact(50.0, 50.0);
        assert!(tracker.calculate_position(&windows[..3]).is_none());
        assert!(tracker.calculate_position::<Vec<f64>>(&[]).is_none());
    }

    #[test]
    fn test_center_impact() {
        let mut tracker = tracker();
        let estimate = tracker.calculate_position(&impact(50.0, 50.0)).unwrap();

        let first = estimate.arrival_ms[0];
        assert!(estimate.arrival_ms.iter().all(|a| (a - first).abs() < 1e-9));
        assert!((estimate.x_cm - 50.0).abs() < 1e-9);
        assert!((estimate.y_cm - 50.0).abs() < 1e-9);
        assert!(estimate.residual < 1e-9);
        assert!(estimate.confidence > 9.99);
        assert!(estimate.accepted);
        assert_eq!(estimate.sequence, 1);
    }

    #[test]
    fn test_known_grid_point_recovered() {
        for &(x, y) in &[(20.0, 30.0), (80.0, 15.0), (33.0, 71.0)] {
            let mut tracker = tracker();
            let estimate = tracker.calculate_position(&impact(x, y)).unwrap();
            assert!((estimate.raw_x_cm - x).abs() <= 1.0, "x {} vs {x}", estimate.raw_x_cm);
            assert!((estimate.raw_y_cm - y).abs() <= 1.0, "y {} vs {y}", estimate.raw_y_cm);
            assert!(estimate.confidence > 9.0);
        }
    }

    #[test]
    fn test_smoothing_favours_recent_estimate() {
        let mut tracker = tracker();
        tracker.calculate_position(&impact(20.0, 30.0)).unwrap();
        let second = tracker.calculate_position(&impact(80.0, 70.0)).unwrap();

        // 0.7 weight on the newest estimate
        assert!((second.x_cm - 62.0).abs() < 1.0);
        assert!((second.y_cm - 58.0).abs() < 1.0);
        let to_recent = (second.x_cm - 80.0).hypot(second.y_cm - 70.0);
        let average_to_recent = (80.0_f64 - 50.0).hypot(70.0 - 50.0);
        assert!(to_recent < average_to_recent);
    }

    #[test]
    fn test_low_confidence_does_not_move() {
        let mut tracker = tracker();
        let good = tracker.calculate_position(&impact(25.0, 75.0)).unwrap();
        let bad = tracker.calculate_position(&inconsistent()).unwrap();

        assert!(bad.confidence <= tracker.config().confidence_gate);
        assert!(!bad.accepted);
        assert!((bad.x_cm - good.x_cm).abs() < 1e-12);
        assert!((bad.y_cm - good.y_cm).abs() < 1e-12);
    }

    #[test]
    fn test_low_confidence_before_any_fix_reports_center() {
        let mut tracker = tracker();
        let bad = tracker.calculate_position(&inconsistent()).unwrap();
        assert!(!bad.accepted);
        assert_eq!((bad.x_cm, bad.y_cm), (50.0, 50.0));
        assert!(tracker.smoothed().is_none());
    }

    #[test]
    fn test_silent_windows() {
        let mut tracker = tracker();
        tracker.calculate_position(&impact(10.0, 10.0)).unwrap();
        let before = tracker.smoothed();

        let silent = vec![vec![0.0; 64]; 4];
        let estimate = tracker.calculate_position(&silent).unwrap();
        assert!(estimate.confidence.abs() < 1e-12);
        assert!(!estimate.accepted);
        assert_eq!((estimate.raw_x_cm, estimate.raw_y_cm), (50.0, 50.0));
        assert!(estimate.arrival_ms.iter().all(|a| (a - 64.0).abs() < 1e-9));
        assert_eq!(tracker.smoothed(), before);
    }

    #[test]
    fn test_setters_keep_smoothing() {
        let mut tracker = tracker();
        tracker.calculate_position(&impact(40.0, 60.0)).unwrap();
        let before = tracker.smoothed();

        tracker.set_threshold(0.2).unwrap();
        tracker.set_wave_speed(25_000.0).unwrap();
        tracker.set_sharpening(3.0).unwrap();
        tracker.set_grid_resolution(2.0).unwrap();
        tracker.set_smoothing(0.5).unwrap();
        tracker.set_confidence_gate(4.0).unwrap();
        tracker.set_calibration_data(vec![CalibrationPoint { id: 1, x_cm: 10.0, y_cm: 20.0 }]);

        assert_eq!(tracker.smoothed(), before);
        assert_eq!(tracker.calibration_points().len(), 1);
        assert!((tracker.config().wave_speed_cm_s - 25_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_setter_leaves_state() {
        let mut tracker = tracker();
        let config = *tracker.config();

        assert!(tracker.set_wave_speed(0.0).is_err());
        assert!(tracker.set_threshold(1.5).is_err());
        assert!(tracker.set_smoothing(0.0).is_err());
        assert!(tracker.set_confidence_gate(11.0).is_err());
        assert!(tracker.set_surface(SurfaceLayout::new(-1.0, 50.0)).is_err());
        assert_eq!(*tracker.config(), config);
        assert_eq!(*tracker.surface(), SurfaceLayout::default());
    }

    #[test]
    fn test_grid_resolution_bounded() {
        let mut tracker = tracker();
        let config = *tracker.config();

        assert!(tracker.set_grid_resolution(1e-300).is_err());
        assert!(tracker.set_grid_resolution(0.001).is_err());
        assert!(tracker.set_grid_resolution(0.02).is_err());
        assert_eq!(*tracker.config(), config);

        // A resize that would blow up the grid is refused as well
        tracker.set_grid_resolution(0.1).unwrap();
        assert!(tracker.set_surface(SurfaceLayout::new(1000.0, 1000.0)).is_err());
        assert_eq!(*tracker.surface(), SurfaceLayout::default());

        let fine = TrackerConfig { grid_resolution_cm: 0.001, ..TrackerConfig::default() };
        assert!(PositionTracker::new(SurfaceLayout::default(), fine).is_err());
    }

    #[test]
    fn test_resize_clamps_smoothed() {
        let mut tracker = tracker();
        tracker.calculate_position(&impact(90.0, 80.0)).unwrap();

        tracker.set_surface(SurfaceLayout::new(60.0, 50.0)).unwrap();
        let (x, y) = tracker.smoothed().unwrap();
        assert!(x <= 60.0 && y <= 50.0);

        tracker.reset_smoothing();
        assert!(tracker.smoothed().is_none());
    }

    #[test]
    fn test_deterministic_output() {
        let windows = impact(37.0, 12.0);
        let a = tracker().calculate_position_at(&windows, 5).unwrap();
        let b = tracker().calculate_position_at(&windows, 5).unwrap();
        assert_eq!(a, b);
    }
}
