//! Error types for the Footfall monitor
//!
//! The data path never fails: malformed samples and windows are ignored.
//! Configuration is the only place a caller can be told "no", so this module
//! holds a single `no_std` error type and the validation rules that raise it.

use core::fmt;

use crate::config::{DetectorConfig, EncoderConfig, TrackerConfig};
use crate::types::{AdcRange, SurfaceLayout};

// ============================================================================
// Configuration Errors
// ============================================================================

/// A tunable was given a value the algorithms cannot work with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Parameter must be finite and strictly positive
    NonPositive {
        /// Parameter name
        parameter: &'static str,
        /// Offending value
        value: f64,
    },
    /// Parameter must lie in `[min, max]`
    OutOfRange {
        /// Parameter name
        parameter: &'static str,
        /// Offending value
        value: f64,
        /// Lowest accepted value
        min: f64,
        /// Highest accepted value
        max: f64,
    },
    /// Dominant-frequency band is empty or above Nyquist
    InvalidBand {
        /// Lower edge (Hz)
        min_hz: f64,
        /// Upper edge (Hz)
        max_hz: f64,
        /// Nyquist frequency (Hz)
        nyquist_hz: f64,
    },
    /// ADC range is empty
    InvalidAdcRange {
        /// Lowest code
        min: i32,
        /// Highest code
        max: i32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive { parameter, value } => {
                write!(f, "{parameter} must be positive and finite, got {value}")
            }
            Self::OutOfRange { parameter, value, min, max } => {
                write!(f, "{parameter} = {value} outside [{min}, {max}]")
            }
            Self::InvalidBand { min_hz, max_hz, nyquist_hz } => {
                write!(
                    f,
                    "Invalid dominant band {min_hz}-{max_hz} Hz (Nyquist {nyquist_hz} Hz)"
                )
            }
            Self::InvalidAdcRange { min, max } => {
                write!(f, "Invalid ADC range: min {min} >= max {max}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

fn positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { parameter, value })
    }
}

fn in_range(parameter: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { parameter, value, min, max })
    }
}

fn at_least(parameter: &'static str, value: u32, min: u32) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            parameter,
            value: f64::from(value),
            min: f64::from(min),
            max: f64::from(u32::MAX),
        })
    }
}

// ============================================================================
// Configuration Validation
// ============================================================================

impl AdcRange {
    /// Validate the range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAdcRange`] if `min >= max`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min < self.max {
            Ok(())
        } else {
            Err(ConfigError::InvalidAdcRange { min: self.min, max: self.max })
        }
    }
}

impl SurfaceLayout {
    /// Validate the surface dimensions.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if either dimension is not positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("width_cm", self.width_cm)?;
        positive("height_cm", self.height_cm)
    }
}

impl DetectorConfig {
    /// Validate detector tunables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("sample_rate_hz", self.sample_rate_hz)?;
        self.adc.validate()?;
        positive("gain", self.gain)?;
        at_least("warmup_samples", self.warmup_samples, 1)?;
        in_range("baseline_alpha", self.baseline_alpha, f64::MIN_POSITIVE, 1.0)?;
        in_range("noise_alpha", self.noise_alpha, f64::MIN_POSITIVE, 1.0)?;
        positive("sensitivity", self.sensitivity)?;
        positive("min_noise_floor", self.min_noise_floor)?;
        at_least("release_samples", self.release_samples, 1)?;
        at_least("min_event_samples", self.min_event_samples, 2)?;
        at_least("max_event_samples", self.max_event_samples, self.min_event_samples)?;
        in_range("min_snr", self.min_snr, 0.0, f64::MAX)?;

        let nyquist_hz = self.nyquist_hz();
        let band_ok = self.min_dominant_hz.is_finite()
            && self.max_dominant_hz.is_finite()
            && self.min_dominant_hz >= 0.0
            && self.min_dominant_hz < self.max_dominant_hz
            && self.max_dominant_hz <= nyquist_hz;
        if !band_ok {
            return Err(ConfigError::InvalidBand {
                min_hz: self.min_dominant_hz,
                max_hz: self.max_dominant_hz,
                nyquist_hz,
            });
        }

        Ok(())
    }
}

impl EncoderConfig {
    /// Validate encoder tunables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("leak_rate", self.leak_rate, 0.0, 1.0 - f64::EPSILON)?;
        positive("threshold", self.threshold)?;
        in_range("reset_potential", self.reset_potential, f64::MIN, self.threshold - f64::EPSILON)?;
        positive("input_scale", self.input_scale)?;
        positive("tick_rate_hz", self.tick_rate_hz)?;
        at_least("rate_window_ticks", self.rate_window_ticks, 1)
    }

    /// Validate the tunables for a neuron keeping `capacity` spike times.
    ///
    /// Every spike inside the rate window must fit in the history, otherwise
    /// the rate would saturate at `capacity` spikes per window.
    ///
    /// # Errors
    ///
    /// As [`EncoderConfig::validate`], plus [`ConfigError::OutOfRange`] for
    /// `rate_window_ticks` when the window can hold more spikes than
    /// `capacity`.
    pub fn validate_for_history(&self, capacity: usize) -> Result<(), ConfigError> {
        self.validate()?;

        // Spikes are at least refractory_ticks + 1 ticks apart
        let spacing = u64::from(self.refractory_ticks) + 1;
        let max_spikes = u64::from(self.rate_window_ticks).div_ceil(spacing);
        let capacity = u64::try_from(capacity).unwrap_or(u64::MAX);
        if max_spikes > capacity {
            #[allow(clippy::cast_precision_loss)]
            let max = capacity.saturating_mul(spacing) as f64;
            return Err(ConfigError::OutOfRange {
                parameter: "rate_window_ticks",
                value: f64::from(self.rate_window_ticks),
                min: 1.0,
                max,
            });
        }
        Ok(())
    }
}

impl TrackerConfig {
    /// Validate tracker tunables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("sample_rate_hz", self.sample_rate_hz)?;
        positive("wave_speed_cm_s", self.wave_speed_cm_s)?;
        in_range("arrival_threshold", self.arrival_threshold, f64::MIN_POSITIVE, 1.0)?;
        in_range(
            "grid_resolution_cm",
            self.grid_resolution_cm,
            Self::MIN_GRID_RESOLUTION_CM,
            f64::MAX,
        )?;
        in_range("smoothing", self.smoothing, f64::MIN_POSITIVE, 1.0)?;
        in_range("confidence_gate", self.confidence_gate, 0.0, 10.0)?;
        in_range("sharpening", self.sharpening, 0.0, f64::MAX)
    }

    /// Validate the tunables against a surface.
    ///
    /// # Errors
    ///
    /// As [`TrackerConfig::validate`], plus [`ConfigError::OutOfRange`] for
    /// `grid_resolution_cm` when the search grid over `surface` would exceed
    /// [`TrackerConfig::MAX_GRID_POINTS`].
    pub fn validate_for(&self, surface: &SurfaceLayout) -> Result<(), ConfigError> {
        self.validate()?;
        surface.validate()?;

        let axis = |length: f64| libm::floor(length / self.grid_resolution_cm + 1e-9) + 1.0;
        let points = axis(surface.width_cm) * axis(surface.height_cm);
        let max_points = f64::from(Self::MAX_GRID_POINTS);
        if points > max_points {
            return Err(ConfigError::OutOfRange {
                parameter: "grid_resolution_cm",
                value: self.grid_resolution_cm,
                min: libm::sqrt(surface.width_cm * surface.height_cm / max_points),
                max: f64::MAX,
            });
        }
        Ok(())
    }
}
