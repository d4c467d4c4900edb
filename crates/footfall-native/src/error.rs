//! Error types for host-side processing
//!
//! Sample and window processing never fails; these errors cover building a
//! monitor from configuration files.

use std::path::PathBuf;

use footfall_core::ConfigError;
use thiserror::Error;

/// Monitor construction and configuration loading errors
#[derive(Error, Debug)]
pub enum MonitorError {
    /// A tunable failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Configuration text was not valid JSON for `MonitorConfig`
    #[error("Malformed configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for monitor setup
pub type MonitorResult<T> = Result<T, MonitorError>;
