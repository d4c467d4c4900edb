//! Footstep event detection
//!
//! - [`detector`]: Adaptive baseline / noise-floor segmentation state machine
//! - [`validation`]: Length, SNR and dominant-frequency checks on a candidate
//!
//! The detector owns all of its rolling statistics; run one detector per
//! monitored zone.

pub mod detector;
pub mod validation;

pub use detector::{DetectorOutput, DetectorPhase, DetectorStats, EventDetector};
pub use validation::{Event, EventMetrics, EventValidator, RejectionReason};
