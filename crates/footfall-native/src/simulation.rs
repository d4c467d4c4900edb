//! Synthetic footstep generator
//!
//! Produces [`SampleFrame`] streams for a rectangular surface: a quiet,
//! slightly noisy background around mid-scale and, on request, an impact at a
//! chosen point. Each corner sees the same decaying tone delayed by its
//! distance to the impact over the wave speed. The primary channel is the mean
//! of the four corners. Output is quantized to ADC codes and fully
//! deterministic for a given seed.

use std::f64::consts::PI;

use footfall_core::types::{AdcRange, Sensor, SurfaceLayout};

use crate::config::MonitorConfig;
use crate::monitor::SampleFrame;

/// Shape of a simulated impact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpactProfile {
    /// Initial amplitude (ADC codes)
    pub amplitude: f64,
    /// Ring frequency of the floor response (Hz)
    pub frequency_hz: f64,
    /// Exponential decay rate of the envelope (1/s)
    pub decay_per_s: f64,
    /// Frames generated per footstep, including the decaying tail
    pub duration_samples: usize,
}

impl Default for ImpactProfile {
    fn default() -> Self {
        Self {
            amplitude: 600.0,
            frequency_hz: 40.0,
            decay_per_s: 25.0,
            duration_samples: 400,
        }
    }
}

/// Deterministic footstep stream generator.
#[derive(Clone, Debug)]
pub struct FootstepSimulator {
    surface: SurfaceLayout,
    sensors: [Sensor; 4],
    adc: AdcRange,
    sample_rate_hz: f64,
    wave_speed_cm_s: f64,
    profile: ImpactProfile,
    /// Gaussian background noise (ADC codes, one sigma)
    noise_std: f64,
    rng_state: u64,
}

impl FootstepSimulator {
    /// Create a simulator matching a monitor configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig, seed: u64) -> Self {
        Self {
            surface: config.surface,
            sensors: config.surface.sensors(),
            adc: config.detector.adc,
            sample_rate_hz: config.detector.sample_rate_hz,
            wave_speed_cm_s: config.tracker.wave_speed_cm_s,
            profile: ImpactProfile::default(),
            noise_std: 0.5,
            // xorshift has a fixed point at zero
            rng_state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    /// Replace the impact shape
    #[must_use]
    pub fn with_profile(mut self, profile: ImpactProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the background noise level (ADC codes, one sigma)
    #[must_use]
    pub fn with_noise(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std.max(0.0);
        self
    }

    /// Background-only frames
    pub fn quiet(&mut self, frames: usize) -> Vec<SampleFrame> {
        (0..frames).map(|_| self.frame([0.0; 4])).collect()
    }

    /// Frames of one impact at `(x_cm, y_cm)`; the impact occurs at the
    /// start of the first frame.
    pub fn footstep(&mut self, x_cm: f64, y_cm: f64) -> Vec<SampleFrame> {
        let delays_s = self.sensors.map(|s| s.distance_to(x_cm, y_cm) / self.wave_speed_cm_s);
        let profile = self.profile;
        let sample_rate = self.sample_rate_hz;

        (0..profile.duration_samples)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64 / sample_rate;
                let signal = delays_s.map(|delay| impact_response(&profile, t - delay));
                self.frame(signal)
            })
            .collect()
    }

    /// Uniform random point at least `margin_cm` inside the surface edges.
    pub fn random_position(&mut self, margin_cm: f64) -> (f64, f64) {
        let margin_x = margin_cm.min(self.surface.width_cm / 2.0);
        let margin_y = margin_cm.min(self.surface.height_cm / 2.0);
        let x = margin_x + self.random_f64() * (self.surface.width_cm - 2.0 * margin_x);
        let y = margin_y + self.random_f64() * (self.surface.height_cm - 2.0 * margin_y);
        (x, y)
    }

    /// Quantize one tick of corner signal around mid-scale and add noise.
    fn frame(&mut self, signal: [f64; 4]) -> SampleFrame {
        let mid = self.adc.midpoint();
        let mut corners = [0.0; 4];
        for (corner, s) in corners.iter_mut().zip(signal) {
            let noise = self.gaussian_noise() * self.noise_std;
            *corner = self.quantize(mid + s + noise);
        }
        let mixed = signal.iter().sum::<f64>() / 4.0;
        let noise = self.gaussian_noise() * self.noise_std;
        SampleFrame { primary: self.quantize(mid + mixed + noise), corners }
    }

    fn quantize(&self, value: f64) -> f64 {
        value.round().clamp(f64::from(self.adc.min), f64::from(self.adc.max))
    }

    fn gaussian_noise(&mut self) -> f64 {
        // Box-Muller transform
        let u1 = self.random_f64().max(f64::MIN_POSITIVE);
        let u2 = self.random_f64();

        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn random_f64(&mut self) -> f64 {
        // xorshift64
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 7;
        self.rng_state ^= self.rng_state << 17;
        #[allow(clippy::cast_precision_loss)]
        let unit = self.rng_state as f64 / u64::MAX as f64;
        unit
    }
}

/// Decaying sinusoid starting at `t = 0`, silent before.
fn impact_response(profile: &ImpactProfile, t: f64) -> f64 {
    if t < 0.0 {
        return 0.0;
    }
    profile.amplitude * (-profile.decay_per_s * t).exp() * (2.0 * PI * profile.frequency_hz * t).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator(seed: u64) -> FootstepSimulator {
        FootstepSimulator::new(&MonitorConfig::default(), seed)
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = simulator(7).footstep(30.0, 40.0);
        let b = simulator(7).footstep(30.0, 40.0);
        assert_eq!(a, b);
        assert_ne!(simulator(8).quiet(50), simulator(7).quiet(50));
    }

    #[test]
    fn test_frames_are_valid_adc_codes() {
        let adc = AdcRange::TWELVE_BIT;
        let mut sim = simulator(1).with_profile(ImpactProfile { amplitude: 5000.0, ..ImpactProfile::default() });
        for frame in sim.footstep(10.0, 10.0) {
            for v in std::iter::once(frame.primary).chain(frame.corners) {
                assert!(adc.sample(v).is_some(), "{v}");
                assert!((v - v.round()).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_nearest_corner_rings_first() {
        let mut sim = simulator(3).with_noise(0.0);
        let frames = sim.footstep(5.0, 5.0);
        let first_motion = |corner: usize| {
            frames.iter().position(|f| (f.corners[corner] - 2048.0).abs() > 20.0).unwrap()
        };
        assert!(first_motion(0) < first_motion(3));
    }

    #[test]
    fn test_random_position_respects_margin() {
        let mut sim = simulator(11);
        for _ in 0..100 {
            let (x, y) = sim.random_position(10.0);
            assert!((10.0..=90.0).contains(&x));
            assert!((10.0..=90.0).contains(&y));
        }
    }
}
