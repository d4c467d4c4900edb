//! Footfall Native - Host-side footstep detection and localization
//!
//! This crate turns raw vibration-sensor streams into footstep events and
//! surface positions:
//! - Adaptive event segmentation with spectral validation
//! - Spike-train activity encoding alongside detection
//! - Four-corner TDOA multilateration with temporal smoothing
//! - A session orchestrator tying the pieces to a synchronized sample stream
//!
//! # Modules
//!
//! - [`processing`]: Spectral analysis and aligned sample history
//! - [`detection`]: Event detector and candidate validation
//! - [`localization`]: Arrival extraction, grid solver and position tracker
//! - [`monitor`]: Per-zone session combining detector, encoder and tracker
//! - [`simulation`]: Synthetic footstep generator for tests and demos
//!
//! # Features
//!
//! - `parallel`: Evaluate the multilateration grid with `rayon`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod detection;
pub mod error;
pub mod localization;
pub mod monitor;
pub mod processing;
pub mod simulation;

// Re-export key types
pub use config::MonitorConfig;
pub use detection::{DetectorOutput, Event, EventDetector, EventMetrics, RejectionReason};
pub use error::{MonitorError, MonitorResult};
pub use localization::{PositionEstimate, PositionTracker};
pub use monitor::{FootstepMonitor, MonitorOutput, SampleFrame};
pub use processing::spectrum::{SpectralAnalyzer, SpectralBin};
