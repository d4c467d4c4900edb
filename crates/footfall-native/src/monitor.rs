//! Per-surface monitoring session
//!
//! `FootstepMonitor` wires the pieces together for one monitored surface:
//!
//! ```text
//!  SampleFrame ──► primary ──► EventDetector ──► amplified ──► LifNeuron ──► spike
//!       │                          │
//!       │                          └─ accepted Event (start_tick..end_tick)
//!       ▼                                   │
//!  CornerHistory ── aligned windows ◄───────┘
//!                         │
//!                         ▼
//!                  PositionTracker ──► PositionEstimate
//! ```
//!
//! Run one monitor per zone; monitors share nothing.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use footfall_core::error::ConfigError;
use footfall_core::math::{finite_or_zero, mean};
use footfall_core::spiking::{LifNeuron, NeuronOutput};
use footfall_core::types::SurfaceLayout;

use crate::config::MonitorConfig;
use crate::detection::{DetectorOutput, Event, EventDetector};
use crate::localization::{PositionEstimate, PositionTracker};
use crate::processing::history::CornerHistory;

/// One synchronized acquisition tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleFrame {
    /// Raw reading of the primary (aggregate) channel
    pub primary: f64,
    /// Raw corner readings in corner order (TL, TR, BL, BR)
    pub corners: [f64; 4],
}

/// Everything produced by one [`FootstepMonitor::push_frame`] call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitorOutput {
    /// Detector tick assigned to this frame; `None` if the frame was ignored
    pub tick: Option<u64>,
    /// Detector output, carrying the accepted event if one closed
    pub detector: DetectorOutput,
    /// Spike encoder output; `None` if the frame was ignored
    #[serde(skip)]
    pub spike: Option<NeuronOutput>,
    /// Localization of the accepted event, if any
    pub position: Option<PositionEstimate>,
}

impl MonitorOutput {
    /// The accepted event, if one closed on this frame
    #[must_use]
    pub fn event(&self) -> Option<&Event> {
        self.detector.event.as_ref()
    }
}

/// Detector, spike encoder and tracker for one monitored surface.
pub struct FootstepMonitor {
    config: MonitorConfig,
    detector: EventDetector,
    neuron: LifNeuron,
    tracker: PositionTracker,
    history: CornerHistory,
}

impl FootstepMonitor {
    /// Build a monitor from a configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any section is invalid.
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            detector: EventDetector::new(config.detector)?,
            neuron: LifNeuron::new(config.encoder)?,
            tracker: PositionTracker::new(config.surface, config.tracker)?,
            history: CornerHistory::new(config.history_samples as usize),
            config,
        })
    }

    /// Process one synchronized tick.
    ///
    /// A frame whose primary reading the detector ignores is dropped entirely,
    /// so corner history stays aligned with detector ticks. Non-finite corner
    /// readings are recorded as zero.
    pub fn push_frame(&mut self, frame: SampleFrame) -> MonitorOutput {
        let tick = self.detector.ticks();
        let detector = self.detector.process_sample(frame.primary);

        if self.detector.ticks() == tick {
            return MonitorOutput { tick: None, detector, spike: None, position: None };
        }

        let spike = self.neuron.encode(detector.amplified);
        self.history.push(frame.corners.map(finite_or_zero));

        let position = detector.event.as_ref().and_then(|event| self.localize(event));

        MonitorOutput { tick: Some(tick), detector, spike: Some(spike), position }
    }

    /// Extract DC-corrected corner windows for an event and localize them.
    fn localize(&mut self, event: &Event) -> Option<PositionEstimate> {
        let pre_trigger = u64::from(self.config.pre_trigger_samples);
        let wanted_start = event.start_tick.saturating_sub(pre_trigger);
        let Some((start, mut windows)) = self.history.window(wanted_start, event.end_tick) else {
            debug!(start_tick = event.start_tick, "Event span no longer in corner history");
            return None;
        };

        #[allow(clippy::cast_possible_truncation)]
        let lead = event.start_tick.saturating_sub(start) as usize;
        for window in &mut windows {
            let offset = if lead > 0 { mean(&window[..lead.min(window.len())]) } else { mean(window) };
            for v in window.iter_mut() {
                *v -= offset;
            }
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let timestamp_us =
            (event.end_tick as f64 * 1_000_000.0 / self.config.detector.sample_rate_hz) as u64;
        self.tracker.calculate_position_at(&windows, timestamp_us)
    }

    /// Restart detection: detector warmup, encoder state and corner history.
    /// The tracker's smoothed position survives.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.neuron.reset();
        self.history.clear();
        info!("Footstep monitor reset");
    }

    /// Forget the tracker's smoothed position.
    pub fn reset_tracking(&mut self) {
        self.tracker.reset_smoothing();
    }

    /// Event detector
    #[must_use]
    pub fn detector(&self) -> &EventDetector {
        &self.detector
    }

    /// Spike encoder
    #[must_use]
    pub fn neuron(&self) -> &LifNeuron {
        &self.neuron
    }

    /// Position tracker
    #[must_use]
    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    /// Position tracker, for live retuning
    pub fn tracker_mut(&mut self) -> &mut PositionTracker {
        &mut self.tracker
    }

    /// Resize the monitored surface.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the tracker refuses the new surface; the
    /// monitor is left unchanged.
    pub fn set_surface(&mut self, surface: SurfaceLayout) -> Result<(), ConfigError> {
        self.tracker.set_surface(surface)?;
        self.config.surface = surface;
        Ok(())
    }

    /// Active configuration, including any retuning done on the tracker
    #[must_use]
    pub fn config(&self) -> MonitorConfig {
        MonitorConfig {
            surface: *self.tracker.surface(),
            tracker: *self.tracker.config(),
            ..self.config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> FootstepMonitor {
        FootstepMonitor::new(MonitorConfig::default()).unwrap()
    }

    fn flat(value: f64) -> SampleFrame {
        SampleFrame { primary: value, corners: [value; 4] }
    }

    #[test]
    fn test_ignored_frames_keep_alignment() {
        let mut monitor = monitor();
        assert_eq!(monitor.push_frame(flat(2048.0)).tick, Some(0));

        let out = monitor.push_frame(SampleFrame { primary: f64::NAN, corners: [2048.0; 4] });
        assert!(out.tick.is_none());
        assert!(out.spike.is_none());

        assert_eq!(monitor.push_frame(flat(2048.0)).tick, Some(1));
        assert_eq!(monitor.history.next_tick(), 2);
    }

    #[test]
    fn test_config_follows_tracker() {
        let mut monitor = monitor();
        monitor.set_surface(SurfaceLayout::new(120.0, 80.0)).unwrap();
        assert_eq!(monitor.config().surface, SurfaceLayout::new(120.0, 80.0));
        assert_eq!(*monitor.tracker().surface(), SurfaceLayout::new(120.0, 80.0));

        monitor.tracker_mut().set_wave_speed(25_000.0).unwrap();
        assert!((monitor.config().tracker.wave_speed_cm_s - 25_000.0).abs() < 1e-9);
        assert!(monitor.config().validate().is_ok());

        assert!(monitor.set_surface(SurfaceLayout::new(0.0, 80.0)).is_err());
        assert_eq!(monitor.config().surface, SurfaceLayout::new(120.0, 80.0));
    }

    #[test]
    fn test_quiet_stream_has_no_events() {
        let mut monitor = monitor();
        for i in 0..1000 {
            let out = monitor.push_frame(flat(2048.0 + f64::from(i % 3)));
            assert!(out.event().is_none());
            assert!(out.position.is_none());
            assert!(!out.spike.unwrap().spiked);
        }
    }

    #[test]
    fn test_reset_keeps_tracking() {
        let mut monitor = monitor();
        let windows = vec![vec![0.0, 1.0, 0.5]; 4];
        monitor.tracker_mut().calculate_position_at(&windows, 0).unwrap();
        let smoothed = monitor.tracker().smoothed();
        assert!(smoothed.is_some());

        monitor.push_frame(flat(2048.0));
        monitor.reset();
        assert_eq!(monitor.detector().ticks(), 0);
        assert!(monitor.history.is_empty());
        assert_eq!(monitor.tracker().smoothed(), smoothed);

        monitor.reset_tracking();
        assert!(monitor.tracker().smoothed().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = MonitorConfig::default();
        config.encoder.threshold = -1.0;
        assert!(FootstepMonitor::new(config).is_err());
    }
}
