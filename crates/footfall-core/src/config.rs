//! Tunables for the detector, spike encoder and position tracker.
//!
//! Every struct is plain data with a valid [`Default`]. Validation lives in
//! [`crate::error`] next to the error type it produces.

use serde::{Deserialize, Serialize};

use crate::types::AdcRange;

// ============================================================================
// Event Detector
// ============================================================================

/// Event detector configuration.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Primary channel sampling rate (Hz)
    pub sample_rate_hz: f64,
    /// Valid ADC codes; anything else is ignored
    pub adc: AdcRange,
    /// Gain applied to the baseline-subtracted reading
    pub gain: f64,
    /// Ticks used only to seed the baseline and noise floor
    pub warmup_samples: u32,
    /// EMA coefficient for the baseline once warm (0 < α ≤ 1)
    pub baseline_alpha: f64,
    /// EMA coefficient for the noise floor once warm (0 < α ≤ 1)
    pub noise_alpha: f64,
    /// Threshold = noise floor × sensitivity
    pub sensitivity: f64,
    /// Lower bound on the noise floor, in amplified units
    pub min_noise_floor: f64,
    /// Consecutive quiet ticks that close a candidate event
    pub release_samples: u32,
    /// Candidate length at which the event is closed regardless
    pub max_event_samples: u32,
    /// Shortest candidate that can be accepted
    pub min_event_samples: u32,
    /// Minimum spectral peak-to-median ratio
    pub min_snr: f64,
    /// Lower edge of the accepted dominant-frequency band (Hz)
    pub min_dominant_hz: f64,
    /// Upper edge of the accepted dominant-frequency band (Hz)
    pub max_dominant_hz: f64,
}

impl DetectorConfig {
    /// Nyquist frequency for the configured sample rate
    #[inline]
    #[must_use]
    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate_hz / 2.0
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 1000.0,
            adc: AdcRange::TWELVE_BIT,
            gain: 4.0,
            warmup_samples: 200,
            baseline_alpha: 0.01,
            noise_alpha: 0.005,
            sensitivity: 4.0,
            min_noise_floor: 2.0,
            release_samples: 20,
            max_event_samples: 2000,
            min_event_samples: 32,
            min_snr: 3.0,
            min_dominant_hz: 5.0,
            max_dominant_hz: 150.0,
        }
    }
}

// ============================================================================
// Spike Encoder
// ============================================================================

/// Leaky integrate-and-fire encoder configuration.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Fraction of membrane potential lost per tick (0 ≤ leak < 1)
    pub leak_rate: f64,
    /// Firing threshold
    pub threshold: f64,
    /// Membrane potential right after a spike
    pub reset_potential: f64,
    /// Ticks after a spike during which input is not integrated
    pub refractory_ticks: u32,
    /// Amplified units corresponding to one unit of input current
    pub input_scale: f64,
    /// Tick rate used to express spike rate in Hz
    pub tick_rate_hz: f64,
    /// Window over which spike rate is computed (ticks)
    pub rate_window_ticks: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            leak_rate: 0.1,
            threshold: 1.0,
            reset_potential: 0.0,
            refractory_ticks: 5,
            input_scale: 256.0,
            tick_rate_hz: 1000.0,
            rate_window_ticks: 500,
        }
    }
}

// ============================================================================
// Position Tracker
// ============================================================================

/// TDOA position tracker configuration.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Corner channel sampling rate (Hz)
    pub sample_rate_hz: f64,
    /// Propagation speed of the impact wave in the surface (cm/s)
    pub wave_speed_cm_s: f64,
    /// Arrival threshold as a fraction of each channel's peak (0 < f ≤ 1)
    pub arrival_threshold: f64,
    /// Grid spacing of the multilateration search (cm)
    pub grid_resolution_cm: f64,
    /// Weight given to the newest accepted estimate (0 < w ≤ 1)
    pub smoothing: f64,
    /// Confidence an estimate must exceed to move the smoothed position
    pub confidence_gate: f64,
    /// Reserved weighting exponent; not used by the solver
    pub sharpening: f64,
}

impl TrackerConfig {
    /// Finest accepted grid spacing (cm)
    pub const MIN_GRID_RESOLUTION_CM: f64 = 0.01;

    /// Most grid points a single solve may evaluate
    pub const MAX_GRID_POINTS: u32 = 1 << 22;
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 1000.0,
            wave_speed_cm_s: 30_000.0,
            arrival_threshold: 0.15,
            grid_resolution_cm: 1.0,
            smoothing: 0.7,
            confidence_gate: 3.0,
            sharpening: 2.0,
        }
    }
}
