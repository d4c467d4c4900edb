//! Spike encoding of the detector's amplified signal
//!
//! A single leaky integrate-and-fire neuron turns the per-tick amplified value
//! into a binary spike train. The spike train is a cheap activity indicator
//! that runs alongside event detection and does not depend on validation.
//!
//! # Example
//!
//! ```rust
//! use footfall_core::config::EncoderConfig;
//! use footfall_core::spiking::LifNeuron;
//!
//! let mut neuron: LifNeuron = LifNeuron::new(EncoderConfig::default()).unwrap();
//!
//! // Strong input fires on the first tick
//! let out = neuron.step(5.0);
//! assert!(out.spiked);
//! assert!(neuron.is_refractory());
//! ```

use heapless::Deque;

use crate::config::EncoderConfig;
use crate::error::ConfigError;

/// Spike times kept for rate estimation unless overridden.
pub const DEFAULT_HISTORY: usize = 128;

/// Result of one integration step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NeuronOutput {
    /// Membrane potential after the step
    pub membrane: f64,
    /// Whether the neuron fired on this step
    pub spiked: bool,
}

// ============================================================================
// Leaky Integrate-and-Fire Neuron
// ============================================================================

/// Leaky integrate-and-fire neuron with a bounded spike-time history.
///
/// Each tick the membrane decays toward zero by `leak_rate`, then the input
/// current is added. Crossing `threshold` emits a spike, drops the membrane to
/// `reset_potential`, and suppresses integration for `refractory_ticks` ticks.
#[derive(Clone, Debug)]
pub struct LifNeuron<const H: usize = DEFAULT_HISTORY> {
    config: EncoderConfig,
    membrane: f64,
    refractory_remaining: u32,
    tick: u64,
    /// Tick indices of recent spikes, oldest first
    history: Deque<u64, H>,
}

impl<const H: usize> LifNeuron<H> {
    /// Create a neuron at rest.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid or the rate
    /// window can hold more spikes than the `H`-entry history.
    pub fn new(config: EncoderConfig) -> Result<Self, ConfigError> {
        config.validate_for_history(H)?;
        Ok(Self {
            config,
            membrane: 0.0,
            refractory_remaining: 0,
            tick: 0,
            history: Deque::new(),
        })
    }

    /// Integrate one tick of input current.
    ///
    /// Non-finite input is treated as zero.
    pub fn step(&mut self, input: f64) -> NeuronOutput {
        let current = if input.is_finite() { input } else { 0.0 };
        let now = self.tick;
        self.tick += 1;

        if self.refractory_remaining > 0 {
            self.refractory_remaining -= 1;
            return NeuronOutput { membrane: self.membrane, spiked: false };
        }

        self.membrane = self.membrane * (1.0 - self.config.leak_rate) + current;
        if !self.membrane.is_finite() {
            // Overflow from extreme input; saturate rather than poison the state
            self.membrane = self.config.threshold;
        }

        if self.membrane >= self.config.threshold {
            self.membrane = self.config.reset_potential;
            self.refractory_remaining = self.config.refractory_ticks;
            self.record_spike(now);
            NeuronOutput { membrane: self.membrane, spiked: true }
        } else {
            NeuronOutput { membrane: self.membrane, spiked: false }
        }
    }

    /// Encode an amplified detector value: `|amplified| / input_scale`.
    pub fn encode(&mut self, amplified: f64) -> NeuronOutput {
        self.step(amplified.abs() / self.config.input_scale)
    }

    fn record_spike(&mut self, tick: u64) {
        if self.history.is_full() {
            self.history.pop_front();
        }
        // Cannot fail: a slot was freed above
        let _ = self.history.push_back(tick);
    }

    /// Spikes per second over the rate window.
    ///
    /// Before a full window has elapsed, the elapsed time is used instead.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn spike_rate(&self) -> f64 {
        if self.tick == 0 {
            return 0.0;
        }
        let window = self.tick.min(u64::from(self.config.rate_window_ticks));
        let cutoff = self.tick - window;
        let spikes = self.history.iter().filter(|&&t| t >= cutoff).count();

        let window_s = window as f64 / self.config.tick_rate_hz;
        spikes as f64 / window_s
    }

    /// Reset membrane, refractory state and spike history.
    pub fn reset(&mut self) {
        self.membrane = 0.0;
        self.refractory_remaining = 0;
        self.tick = 0;
        self.history.clear();
    }

    /// Current membrane potential
    #[inline]
    #[must_use]
    pub fn membrane(&self) -> f64 {
        self.membrane
    }

    /// Check if the neuron is in its refractory period
    #[inline]
    #[must_use]
    pub fn is_refractory(&self) -> bool {
        self.refractory_remaining > 0
    }

    /// Number of spikes currently held in the history
    #[inline]
    #[must_use]
    pub fn spike_count(&self) -> usize {
        self.history.len()
    }

    /// Ticks integrated since creation or the last reset
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
