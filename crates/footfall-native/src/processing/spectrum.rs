//! FFT-based spectral analysis
//!
//! Provides the magnitude spectrum of a candidate event together with the two
//! figures used to validate it: dominant frequency and spectral SNR.

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use footfall_core::math::median_in_place;

/// One bin of a single-sided magnitude spectrum
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectralBin {
    /// Bin centre frequency (Hz)
    pub frequency_hz: f64,
    /// Bin magnitude (same units as the input samples)
    pub magnitude: f64,
}

/// FFT-based spectral analyzer
///
/// Buffers are reused between calls; the FFT length follows the input,
/// zero-padded to the next power of two.
pub struct SpectralAnalyzer {
    sample_rate: f64,
    planner: FftPlanner<f64>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralAnalyzer {
    /// Create a new spectral analyzer
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    #[must_use]
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            planner: FftPlanner::new(),
            buffer: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// FFT length used for an input of `len` samples
    #[must_use]
    pub fn fft_size(len: usize) -> usize {
        len.max(2).next_power_of_two()
    }

    /// Frequency resolution (Hz per bin) for an input of `len` samples
    #[must_use]
    pub fn frequency_resolution(&self, len: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let size = Self::fft_size(len) as f64;
        self.sample_rate / size
    }

    /// Compute the single-sided magnitude spectrum of `samples`.
    ///
    /// A Hann window is applied before zero-padding. Magnitudes are scaled by
    /// the window's coherent gain so a sinusoid of amplitude A peaks near A.
    /// Returns an empty spectrum for empty input.
    pub fn magnitude_spectrum(&mut self, samples: &[f64]) -> Vec<SpectralBin> {
        if samples.is_empty() {
            return Vec::new();
        }

        let fft_size = Self::fft_size(samples.len());
        let window = hann_window(samples.len());
        let window_sum: f64 = window.iter().sum();

        // Apply window and copy to buffer, zero-padding the tail
        self.buffer.clear();
        self.buffer.extend(
            samples
                .iter()
                .zip(window.iter())
                .map(|(&s, &w)| Complex::new(if s.is_finite() { s * w } else { 0.0 }, 0.0)),
        );
        self.buffer.resize(fft_size, Complex::new(0.0, 0.0));

        // Perform FFT
        let fft = self.planner.plan_fft_forward(fft_size);
        self.scratch.resize(fft.get_inplace_scratch_len(), Complex::new(0.0, 0.0));
        fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        // Single-sided magnitude, positive frequencies only
        let n_freqs = fft_size / 2 + 1;
        let norm = if window_sum > 0.0 { 2.0 / window_sum } else { 0.0 };
        #[allow(clippy::cast_precision_loss)]
        let bin_hz = self.sample_rate / fft_size as f64;

        self.buffer[..n_freqs]
            .iter()
            .enumerate()
            .map(|(k, c)| {
                #[allow(clippy::cast_precision_loss)]
                let frequency_hz = k as f64 * bin_hz;
                SpectralBin { frequency_hz, magnitude: c.norm() * norm }
            })
            .collect()
    }

    /// Sample rate in Hz
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

/// Bin with the largest magnitude, excluding DC.
#[must_use]
pub fn dominant_bin(spectrum: &[SpectralBin]) -> Option<SpectralBin> {
    spectrum
        .iter()
        .skip(1)
        .copied()
        .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
}

/// Ratio of the peak magnitude to the median magnitude, excluding DC.
///
/// Returns 0.0 when the spectrum has no non-DC content.
#[must_use]
pub fn spectral_snr(spectrum: &[SpectralBin]) -> f64 {
    let mut magnitudes: Vec<f64> = spectrum.iter().skip(1).map(|b| b.magnitude).collect();
    let peak = magnitudes.iter().copied().fold(0.0, f64::max);
    if peak <= 0.0 {
        return 0.0;
    }
    let background = median_in_place(&mut magnitudes);
    peak / background.max(f64::MIN_POSITIVE)
}

/// Generate Hann window coefficients
fn hann_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    #[allow(clippy::cast_precision_loss)]
    let denom = (size - 1) as f64;
    (0..size)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let phase = 2.0 * std::f64::consts::PI * i as f64 / denom;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f64, sample_rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * freq_hz * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_dominant_frequency_of_sine() {
        let mut analyzer = SpectralAnalyzer::new(1000.0);
        let spectrum = analyzer.magnitude_spectrum(&sine(62.5, 1000.0, 256));

        assert_eq!(spectrum.len(), 129);
        let peak = dominant_bin(&spectrum).unwrap();
        assert!((peak.frequency_hz - 62.5).abs() < analyzer.frequency_resolution(256));
        // Coherent-gain scaling keeps the peak near the sine amplitude
        assert!(peak.magnitude > 0.8 && peak.magnitude < 1.1);
    }

    #[test]
    fn test_zero_padding() {
        let mut analyzer = SpectralAnalyzer::new(1000.0);
        let spectrum = analyzer.magnitude_spectrum(&sine(40.0, 1000.0, 100));

        // 100 samples pad to 128 -> 65 bins, 7.8125 Hz apart
        assert_eq!(spectrum.len(), 65);
        assert!((spectrum[1].frequency_hz - 7.8125).abs() < 1e-9);
        let peak = dominant_bin(&spectrum).unwrap();
        assert!((peak.frequency_hz - 40.0).abs() < 8.0);
    }

    #[test]
    fn test_dc_excluded_from_dominant() {
        let mut analyzer = SpectralAnalyzer::new(1000.0);
        let samples: Vec<f64> = sine(100.0, 1000.0, 128).iter().map(|s| 5.0 + 20.0 * s).collect();
        let spectrum = analyzer.magnitude_spectrum(&samples);

        assert!(spectrum[0].magnitude > 5.0);
        let peak = dominant_bin(&spectrum).unwrap();
        assert!((peak.frequency_hz - 100.0).abs() < 8.0);
    }

    #[test]
    fn test_snr_tone_vs_silence() {
        let mut analyzer = SpectralAnalyzer::new(1000.0);
        let tone = analyzer.magnitude_spectrum(&sine(50.0, 1000.0, 256));
        assert!(spectral_snr(&tone) > 10.0);

        let silence = analyzer.magnitude_spectrum(&[0.0; 64]);
        assert!(spectral_snr(&silence).abs() < 1e-12);
        assert!(analyzer.magnitude_spectrum(&[]).is_empty());
    }
}
