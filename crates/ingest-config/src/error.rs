//! Error types for configuration resolution.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required parameters were absent from every source.
    #[error("missing required parameters: {}", fields.join(", "))]
    MissingFields {
        /// Every missing parameter, in declaration order.
        fields: Vec<&'static str>,
    },
    /// A parameter was present but unusable.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Parameter name.
        field: &'static str,
        /// Offending value when it is safe to report.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The parameter file could not be read.
    #[error("failed to read parameter file '{}'", path.display())]
    ReadParams {
        /// File that was requested.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The parameter document was not valid JSON.
    #[error("parameter document is not valid JSON")]
    ParseParams {
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The parameter document was valid JSON but not an object.
    #[error("parameter document must be a JSON object")]
    ParamsNotObject,
}

impl ConfigError {
    /// Build an invalid-field error.
    #[must_use]
    pub const fn invalid(field: &'static str, reason: &'static str, value: Option<String>) -> Self {
        Self::InvalidField {
            field,
            value,
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
