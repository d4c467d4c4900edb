//! Footfall Core - `no_std` compatible types, configuration and spike encoding
//!
//! This crate provides the foundational pieces of the Footfall vibration-floor
//! monitor. It is designed to run both on the acquisition MCU and on the host,
//! so nothing here allocates or logs.
//!
//! # Modules
//!
//! - [`types`]: ADC samples, sensor layout, calibration marks
//! - [`config`]: Tunables for the detector, spike encoder and tracker
//! - [`error`]: Configuration validation errors
//! - [`math`]: Adaptive means, medians and threshold-crossing interpolation
//! - [`spiking`]: Leaky integrate-and-fire spike encoder
//!
//! # Features
//!
//! - `std`: Enable standard library support (`std::error::Error` impls)
//!
//! # Example
//!
//! ```rust
//! use footfall_core::types::{AdcRange, SurfaceLayout};
//!
//! let adc = AdcRange::default();
//! assert!(adc.sample(2048.0).is_some());
//! assert!(adc.sample(5000.0).is_none());
//!
//! let surface = SurfaceLayout::new(120.0, 80.0);
//! assert_eq!(surface.center(), (60.0, 40.0));
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod error;
pub mod math;
pub mod spiking;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{DetectorConfig, EncoderConfig, TrackerConfig};
pub use error::ConfigError;
pub use math::AdaptiveMean;
pub use spiking::{LifNeuron, NeuronOutput};
pub use types::{AdcRange, CalibrationPoint, Corner, RawSample, Sensor, SurfaceLayout};
