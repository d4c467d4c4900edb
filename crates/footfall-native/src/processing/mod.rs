//! Signal processing
//!
//! - [`spectrum`]: Magnitude spectra, dominant frequency and spectral SNR
//! - [`history`]: Ring buffer of synchronized corner samples

pub mod history;
pub mod spectrum;
