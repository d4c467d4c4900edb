//! Spectral validation of candidate events
//!
//! A candidate window closed by the detector becomes an [`Event`] only if it
//! is long enough, stands out spectrally from its own background, and has its
//! dominant frequency inside the footstep band.

use std::fmt;

use serde::{Deserialize, Serialize};

use footfall_core::config::DetectorConfig;
use footfall_core::math::{finite_or_zero, peak_abs};

use crate::processing::spectrum::{dominant_bin, spectral_snr, SpectralAnalyzer, SpectralBin};

/// Summary figures of an accepted event
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventMetrics {
    /// Spectral peak magnitude over median background magnitude
    pub snr: f64,
    /// Frequency of the strongest non-DC bin (Hz)
    pub dominant_hz: f64,
    /// Largest absolute amplified sample
    pub peak_amplitude: f64,
    /// Root-mean-square of the amplified samples
    pub rms: f64,
    /// Event length in milliseconds
    pub duration_ms: f64,
}

/// A validated footstep
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Amplified samples, oldest first
    pub samples: Vec<f64>,
    /// Single-sided magnitude spectrum of `samples`
    pub spectrum: Vec<SpectralBin>,
    /// Summary metrics
    pub metrics: EventMetrics,
    /// Detector tick of the first sample
    pub start_tick: u64,
    /// Detector tick of the last sample
    pub end_tick: u64,
}

/// Why a candidate was discarded
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Fewer samples than `min_event_samples`
    TooShort {
        /// Candidate length
        length: usize,
        /// Required length
        minimum: u32,
    },
    /// Spectrum too flat to be an impact
    LowSnr {
        /// Measured SNR
        snr: f64,
        /// Required SNR
        minimum: f64,
    },
    /// Dominant frequency outside the footstep band
    OutOfBand {
        /// Measured dominant frequency (Hz)
        dominant_hz: f64,
        /// Band lower edge (Hz)
        min_hz: f64,
        /// Band upper edge (Hz)
        max_hz: f64,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { length, minimum } => {
                write!(f, "too short: {length} < {minimum} samples")
            }
            Self::LowSnr { snr, minimum } => {
                write!(f, "low SNR: {snr:.2} < {minimum:.2}")
            }
            Self::OutOfBand { dominant_hz, min_hz, max_hz } => {
                write!(f, "dominant {dominant_hz:.1} Hz outside {min_hz:.1}-{max_hz:.1} Hz")
            }
        }
    }
}

/// Applies the acceptance rules to candidate windows.
pub struct EventValidator {
    analyzer: SpectralAnalyzer,
    min_samples: u32,
    min_snr: f64,
    min_dominant_hz: f64,
    max_dominant_hz: f64,
}

impl EventValidator {
    /// Build a validator from detector tunables (assumed already validated).
    #[must_use]
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            analyzer: SpectralAnalyzer::new(config.sample_rate_hz),
            min_samples: config.min_event_samples,
            min_snr: config.min_snr,
            min_dominant_hz: config.min_dominant_hz,
            max_dominant_hz: config.max_dominant_hz,
        }
    }

    /// Validate a candidate.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule. Length is checked before any FFT work.
    pub fn validate(
        &mut self,
        samples: Vec<f64>,
        start_tick: u64,
    ) -> Result<Event, RejectionReason> {
        if samples.len() < self.min_samples as usize {
            return Err(RejectionReason::TooShort {
                length: samples.len(),
                minimum: self.min_samples,
            });
        }

        let spectrum = self.analyzer.magnitude_spectrum(&samples);
        let snr = spectral_snr(&spectrum);
        if snr < self.min_snr {
            return Err(RejectionReason::LowSnr { snr, minimum: self.min_snr });
        }

        let dominant_hz = dominant_bin(&spectrum).map_or(0.0, |bin| bin.frequency_hz);
        if dominant_hz < self.min_dominant_hz || dominant_hz > self.max_dominant_hz {
            return Err(RejectionReason::OutOfBand {
                dominant_hz,
                min_hz: self.min_dominant_hz,
                max_hz: self.max_dominant_hz,
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let n = samples.len() as f64;
        let rms = (samples.iter().map(|&s| finite_or_zero(s).powi(2)).sum::<f64>() / n).sqrt();
        let metrics = EventMetrics {
            snr,
            dominant_hz,
            peak_amplitude: peak_abs(&samples),
            rms,
            duration_ms: n / self.analyzer.sample_rate() * 1000.0,
        };

        Ok(Event {
            end_tick: start_tick + samples.len() as u64 - 1,
            samples,
            spectrum,
            metrics,
            start_tick,
        })
    }
}
