//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration document failed.
    #[error("failed to read configuration file")]
    Io {
        /// Path of the configuration document.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// YAML document could not be parsed.
    #[error("failed to parse yaml configuration")]
    Yaml {
        /// Path of the configuration document.
        path: PathBuf,
        /// Source YAML error.
        source: serde_yaml::Error,
    },
    /// JSON document could not be parsed.
    #[error("failed to parse json configuration")]
    Json {
        /// Path of the configuration document.
        path: PathBuf,
        /// Source JSON error.
        source: serde_json::Error,
    },
    /// File extension did not map to a supported document format.
    #[error("unsupported configuration format")]
    UnsupportedFormat {
        /// Path of the configuration document.
        path: PathBuf,
    },
    /// An environment override was present but unusable.
    #[error("invalid environment override")]
    InvalidEnv {
        /// Name of the environment variable.
        name: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
