//! Error types for gslb-metrics
//!
//! Only construction, registration, exposition and configuration can fail.
//! Recording a metric never returns an error.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Failed to construct instrument {metric}: {source}")]
    InstrumentConstruction {
        metric: String,
        #[source]
        source: prometheus::Error,
    },

    #[error("Can't register prometheus metric {metric}: {source}")]
    Registration {
        metric: String,
        #[source]
        source: prometheus::Error,
    },

    #[error("Prometheus metrics registration already failed on {metric}: {reason}")]
    RegistrationFailed { metric: String, reason: String },

    #[error("Failed to encode metrics: {0}")]
    Encoding(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results
pub type MetricsResult<T> = Result<T, MetricsError>;
