//! Adaptive single-channel event segmentation
//!
//! The detector consumes one primary-channel ADC reading per tick:
//!
//! ```text
//!  Warmup ──(warmup_samples ticks)──► Monitoring ◄──────────────┐
//!                                        │ deviation > threshold │
//!                                        ▼                       │
//!                                   Accumulating ──(release_samples quiet ticks
//!                                                   or max_event_samples)──► validate
//! ```
//!
//! Baseline and noise floor are seeded as cumulative means during warmup and
//! then follow slow EMAs while monitoring. They are held while a candidate
//! accumulates so the footstep does not raise its own threshold. A shadow
//! copy of the baseline keeps tracking the raw level meanwhile; it replaces the
//! baseline when a candidate runs into `max_event_samples` and is rejected,
//! which absorbs a lasting DC offset instead of re-triggering on it forever.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use footfall_core::config::DetectorConfig;
use footfall_core::error::ConfigError;
use footfall_core::math::AdaptiveMean;

use super::validation::{Event, EventValidator, RejectionReason};

/// Segmentation state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectorPhase {
    /// Seeding baseline and noise floor; no events possible
    Warmup,
    /// Tracking the background, waiting for a threshold crossing
    Monitoring,
    /// Collecting a candidate event
    Accumulating,
}

/// Per-tick detector output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorOutput {
    /// Baseline-subtracted reading times gain
    pub amplified: f64,
    /// Whether this tick was part of warmup
    pub is_warmup: bool,
    /// Whether a candidate is being accumulated after this tick
    pub event_active: bool,
    /// Samples in the candidate buffer
    pub event_length: usize,
    /// Absolute amplified value compared against the threshold
    pub deviation: f64,
    /// Current detection threshold (amplified units)
    pub threshold: f64,
    /// Validated event closed on this tick
    pub event: Option<Event>,
}

impl DetectorOutput {
    fn idle(threshold: f64) -> Self {
        Self {
            amplified: 0.0,
            is_warmup: true,
            event_active: false,
            event_length: 0,
            deviation: 0.0,
            threshold,
            event: None,
        }
    }
}

/// Running counters since the last reset
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorStats {
    /// Samples consumed
    pub ticks: u64,
    /// Samples discarded as malformed or out of range
    pub ignored_samples: u64,
    /// Events emitted
    pub accepted: u64,
    /// Candidates discarded by validation
    pub rejected: u64,
    /// Reason for the most recent rejection
    pub last_rejection: Option<RejectionReason>,
}

/// Footstep event detector for one primary channel.
pub struct EventDetector {
    config: DetectorConfig,
    validator: EventValidator,
    phase: DetectorPhase,
    baseline: AdaptiveMean,
    noise_floor: AdaptiveMean,
    /// Baseline that keeps following the raw level during a candidate
    shadow_baseline: AdaptiveMean,
    warmup_remaining: u32,
    buffer: Vec<f64>,
    /// Consecutive below-threshold ticks at the end of the buffer
    quiet_run: u32,
    start_tick: u64,
    stats: DetectorStats,
    last_output: DetectorOutput,
}

impl EventDetector {
    /// Create a detector in the warmup phase.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut detector = Self {
            config,
            validator: EventValidator::new(&config),
            phase: DetectorPhase::Warmup,
            baseline: AdaptiveMean::new(config.baseline_alpha),
            noise_floor: AdaptiveMean::new(config.noise_alpha),
            shadow_baseline: AdaptiveMean::new(config.baseline_alpha),
            warmup_remaining: config.warmup_samples,
            buffer: Vec::with_capacity(config.max_event_samples as usize),
            quiet_run: 0,
            start_tick: 0,
            stats: DetectorStats::default(),
            last_output: DetectorOutput::idle(0.0),
        };
        detector.last_output.threshold = detector.threshold();
        Ok(detector)
    }

    /// Process one raw reading.
    ///
    /// Readings that are non-finite or outside the ADC range are ignored: no
    /// tick is consumed and the previous output is returned (without its event).
    pub fn process_sample(&mut self, raw: f64) -> DetectorOutput {
        let Some(sample) = self.config.adc.sample(raw) else {
            self.stats.ignored_samples += 1;
            return self.last_output.clone();
        };

        let tick = self.stats.ticks;
        self.stats.ticks += 1;
        let x = sample.to_f64();

        let output = if self.phase == DetectorPhase::Warmup {
            self.warmup_step(x)
        } else {
            self.detect_step(x, tick)
        };

        self.last_output = DetectorOutput { event: None, ..output.clone() };
        output
    }

    /// Parse and process a textual reading.
    ///
    /// Text that is not a number in the ADC range is ignored like any other
    /// invalid reading.
    pub fn process_raw_str(&mut self, text: &str) -> DetectorOutput {
        match self.config.adc.parse(text) {
            Some(sample) => self.process_sample(sample.to_f64()),
            None => {
                self.stats.ignored_samples += 1;
                self.last_output.clone()
            }
        }
    }

    fn warmup_step(&mut self, x: f64) -> DetectorOutput {
        self.baseline.seed(x);
        let amplified = (x - self.baseline.value()) * self.config.gain;
        let deviation = amplified.abs();
        self.noise_floor.seed(deviation);

        self.warmup_remaining -= 1;
        if self.warmup_remaining == 0 {
            self.phase = DetectorPhase::Monitoring;
            trace!(
                baseline = self.baseline.value(),
                noise_floor = self.noise_floor.value(),
                "Detector warmup complete"
            );
        }

        DetectorOutput {
            amplified,
            is_warmup: true,
            event_active: false,
            event_length: 0,
            deviation,
            threshold: self.threshold(),
            event: None,
        }
    }

    fn detect_step(&mut self, x: f64, tick: u64) -> DetectorOutput {
        let amplified = (x - self.baseline.value()) * self.config.gain;
        let deviation = amplified.abs();
        let threshold = self.threshold();
        let mut event = None;

        if self.phase == DetectorPhase::Monitoring {
            if deviation > threshold {
                self.phase = DetectorPhase::Accumulating;
                self.buffer.clear();
                self.buffer.push(amplified);
                self.quiet_run = 0;
                self.start_tick = tick;
                self.shadow_baseline.clone_from(&self.baseline);
                self.shadow_baseline.update(x);
                trace!(tick, deviation, threshold, "Candidate started");
            } else {
                self.baseline.update(x);
                self.noise_floor.update(deviation);
            }
        } else {
            self.buffer.push(amplified);
            self.shadow_baseline.update(x);
            if deviation > threshold {
                self.quiet_run = 0;
            } else {
                self.quiet_run += 1;
            }

            let capped = self.buffer.len() >= self.config.max_event_samples as usize;
            if capped || self.quiet_run >= self.config.release_samples {
                event = self.close_candidate(capped);
            }
        }

        let event_active = self.phase == DetectorPhase::Accumulating;
        DetectorOutput {
            amplified,
            is_warmup: false,
            event_active,
            event_length: if event_active { self.buffer.len() } else { 0 },
            deviation,
            threshold,
            event,
        }
    }

    /// Close the candidate, trimming the quiet tail, and validate it.
    ///
    /// A rejected candidate that hit the length cap hands its shadow baseline
    /// over to the live one.
    fn close_candidate(&mut self, capped: bool) -> Option<Event> {
        let keep = self.buffer.len().saturating_sub(self.quiet_run as usize);
        self.buffer.truncate(keep);
        let samples = std::mem::take(&mut self.buffer);
        self.buffer = Vec::with_capacity(self.config.max_event_samples as usize);
        self.quiet_run = 0;
        self.phase = DetectorPhase::Monitoring;

        match self.validator.validate(samples, self.start_tick) {
            Ok(event) => {
                self.stats.accepted += 1;
                debug!(
                    start_tick = event.start_tick,
                    length = event.samples.len(),
                    snr = event.metrics.snr,
                    dominant_hz = event.metrics.dominant_hz,
                    "Footstep event accepted"
                );
                Some(event)
            }
            Err(reason) => {
                self.stats.rejected += 1;
                self.stats.last_rejection = Some(reason);
                debug!(start_tick = self.start_tick, %reason, "Candidate rejected");
                if capped {
                    std::mem::swap(&mut self.baseline, &mut self.shadow_baseline);
                    debug!(baseline = self.baseline.value(), "Baseline re-levelled after capped candidate");
                }
                None
            }
        }
    }

    /// Detection threshold in amplified units
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.noise_floor.value().max(self.config.min_noise_floor) * self.config.sensitivity
    }

    /// Discard all rolling statistics and any pending candidate.
    pub fn reset(&mut self) {
        self.phase = DetectorPhase::Warmup;
        self.baseline.reset();
        self.noise_floor.reset();
        self.shadow_baseline.reset();
        self.warmup_remaining = self.config.warmup_samples;
        self.buffer.clear();
        self.quiet_run = 0;
        self.start_tick = 0;
        self.stats = DetectorStats::default();
        self.last_output = DetectorOutput::idle(self.threshold());
        info!("Event detector reset");
    }

    /// Current segmentation phase
    #[must_use]
    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    /// Rolling baseline (ADC codes)
    #[must_use]
    pub fn baseline(&self) -> f64 {
        self.baseline.value()
    }

    /// Rolling noise floor (amplified units)
    #[must_use]
    pub fn noise_floor(&self) -> f64 {
        self.noise_floor.value()
    }

    /// Samples consumed since the last reset
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.stats.ticks
    }

    /// Counters since the last reset
    #[must_use]
    pub fn stats(&self) -> &DetectorStats {
        &self.stats
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}
