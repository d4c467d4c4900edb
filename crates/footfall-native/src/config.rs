//! Session configuration
//!
//! `MonitorConfig` bundles every tunable a [`crate::monitor::FootstepMonitor`]
//! needs. It is plain serde data so deployments can keep it in a JSON file;
//! missing fields fall back to their defaults.
//!
//! ```json
//! {
//!   "detector": { "warmup_samples": 500, "min_snr": 4.0 },
//!   "surface": { "width_cm": 120.0, "height_cm": 80.0 },
//!   "pre_trigger_samples": 40
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use footfall_core::config::{DetectorConfig, EncoderConfig, TrackerConfig};
use footfall_core::error::ConfigError;
use footfall_core::spiking::DEFAULT_HISTORY;
use footfall_core::types::SurfaceLayout;

use crate::error::{MonitorError, MonitorResult};

/// Complete configuration for one monitored surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Primary-channel event detector
    pub detector: DetectorConfig,
    /// Spike encoder fed from the amplified signal
    pub encoder: EncoderConfig,
    /// Surface dimensions; sensors sit in the corners
    pub surface: SurfaceLayout,
    /// Multilateration tracker
    pub tracker: TrackerConfig,
    /// Corner samples included before an event's first tick
    pub pre_trigger_samples: u32,
    /// Corner frames retained for window extraction
    pub history_samples: u32,
}

impl MonitorConfig {
    /// Default pre-trigger length in samples
    pub const DEFAULT_PRE_TRIGGER: u32 = 50;
    /// Default corner history length in samples
    pub const DEFAULT_HISTORY: u32 = 4096;

    /// Validate every section and their consistency.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found. The corner history must hold a
    /// maximal event plus its pre-trigger, and detector and tracker must agree
    /// on the sample rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        self.encoder.validate_for_history(DEFAULT_HISTORY)?;
        self.tracker.validate_for(&self.surface)?;

        let needed = self.detector.max_event_samples.saturating_add(self.pre_trigger_samples);
        if self.history_samples < needed {
            return Err(ConfigError::OutOfRange {
                parameter: "history_samples",
                value: f64::from(self.history_samples),
                min: f64::from(needed),
                max: f64::from(u32::MAX),
            });
        }

        let rate = self.detector.sample_rate_hz;
        if (self.tracker.sample_rate_hz - rate).abs() > f64::EPSILON * rate {
            return Err(ConfigError::OutOfRange {
                parameter: "tracker.sample_rate_hz",
                value: self.tracker.sample_rate_hz,
                min: rate,
                max: rate,
            });
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Parse`] for malformed JSON and
    /// [`MonitorError::Config`] for invalid values.
    pub fn from_json_str(json: &str) -> MonitorResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Io`] if the file cannot be read, otherwise as
    /// [`MonitorConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MonitorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Pretty JSON rendering
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Parse`] if serialization fails.
    pub fn to_json_pretty(&self) -> MonitorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            encoder: EncoderConfig::default(),
            surface: SurfaceLayout::default(),
            tracker: TrackerConfig::default(),
            pre_trigger_samples: Self::DEFAULT_PRE_TRIGGER,
            history_samples: Self::DEFAULT_HISTORY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pre_trigger_samples, 50);
        assert_eq!(config.history_samples, 4096);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MonitorConfig::from_json_str(
            r#"{ "surface": { "width_cm": 120.0, "height_cm": 80.0 }, "detector": { "min_snr": 5.0 } }"#,
        )
        .unwrap();
        assert!((config.surface.width_cm - 120.0).abs() < 1e-12);
        assert!((config.detector.min_snr - 5.0).abs() < 1e-12);
        assert_eq!(config.detector.warmup_samples, 200);
        assert_eq!(config.history_samples, 4096);
    }

    #[test]
    fn test_json_round_trip() {
        let config = MonitorConfig::default();
        let json = config.to_json_pretty().unwrap();
        let parsed = MonitorConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.detector.warmup_samples, config.detector.warmup_samples);
        assert_eq!(parsed.detector.adc, config.detector.adc);
        assert!((parsed.detector.noise_alpha - config.detector.noise_alpha).abs() < 1e-12);
        assert!((parsed.tracker.wave_speed_cm_s - config.tracker.wave_speed_cm_s).abs() < 1e-9);
    }

    #[test]
    fn test_history_too_short() {
        let config = MonitorConfig { history_samples: 100, ..MonitorConfig::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { parameter: "history_samples", .. })
        ));
    }

    #[test]
    fn test_rate_window_must_fit_spike_history() {
        let mut config = MonitorConfig::default();
        config.encoder.refractory_ticks = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { parameter: "rate_window_ticks", .. })
        ));
    }

    #[test]
    fn test_sample_rate_mismatch() {
        let mut config = MonitorConfig::default();
        config.tracker.sample_rate_hz = 2000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_errors_are_classified() {
        assert!(matches!(
            MonitorConfig::from_json_str("{ not json"),
            Err(MonitorError::Parse(_))
        ));
        assert!(matches!(
            MonitorConfig::from_json_str(r#"{ "surface": { "width_cm": 0.0, "height_cm": 50.0 } }"#),
            Err(MonitorError::Config(ConfigError::NonPositive { .. }))
        ));
        assert!(matches!(
            MonitorConfig::load("/nonexistent/footfall.json"),
            Err(MonitorError::Io { .. })
        ));
    }
}
