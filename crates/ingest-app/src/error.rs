//! # Design
//!
//! - Centralize errors raised while wiring and executing a run.
//! - Keep error messages constant while carrying an `operation` context field.
//! - Map every error to the exit code the caller sees.

use ingest_config::ConfigError;
use ingest_core::StorageError;
use ingest_invoker::InvokerError;
use ingest_pipeline::PipelineError;
use ingest_telemetry::TelemetryError;
use thiserror::Error;

/// Exit code for unusable parameters.
pub const EXIT_CONFIGURATION: u8 = 2;
/// Exit code for a run that started but failed.
pub const EXIT_FAILURE: u8 = 3;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Parameters could not be resolved.
    #[error("configuration rejected")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        #[source]
        source: ConfigError,
    },
    /// Logging or metrics setup failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The run id could not be sent as a request header.
    #[error("run id '{value}' is not a valid header value")]
    InvalidRequestId {
        /// Offending run id.
        value: String,
    },
    /// The HTTP client could not be built.
    #[error("http client setup failed")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// Source HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The storage adapter could not be built.
    #[error("storage adapter setup failed")]
    Storage {
        /// Operation identifier.
        operation: &'static str,
        /// Source storage error.
        #[source]
        source: StorageError,
    },
    /// The action runtime adapter could not be built.
    #[error("action runtime setup failed")]
    Invoker {
        /// Operation identifier.
        operation: &'static str,
        /// Source invoker error.
        #[source]
        source: InvokerError,
    },
    /// The run finished with `Failure`.
    #[error(transparent)]
    Run {
        /// Run-fatal cause.
        source: PipelineError,
    },
}

impl AppError {
    /// Build a configuration error.
    #[must_use]
    pub const fn config(operation: &'static str, source: ConfigError) -> Self {
        Self::Config { operation, source }
    }

    /// Build a telemetry error.
    #[must_use]
    pub const fn telemetry(operation: &'static str, source: TelemetryError) -> Self {
        Self::Telemetry { operation, source }
    }

    /// Build a storage setup error.
    #[must_use]
    pub const fn storage(operation: &'static str, source: StorageError) -> Self {
        Self::Storage { operation, source }
    }

    /// Build an invoker setup error.
    #[must_use]
    pub const fn invoker(operation: &'static str, source: InvokerError) -> Self {
        Self::Invoker { operation, source }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config { .. } | Self::Invoker { .. } => EXIT_CONFIGURATION,
            Self::Run { source } if source.is_configuration() => EXIT_CONFIGURATION,
            _ => EXIT_FAILURE,
        }
    }
}
