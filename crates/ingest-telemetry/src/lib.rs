//! Logging and metrics shared by the ingest job.
//!
//! Logs are written to stderr so stdout stays reserved for the run result
//! document. Metrics live in a private Prometheus registry and are flushed to a
//! textfile at the end of a run.

pub mod error;
pub mod init;
pub mod metrics;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use metrics::{Metrics, MetricsSnapshot};
