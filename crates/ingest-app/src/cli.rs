//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use ingest_config::{ConfigResult, Parameters, parse_params, read_params_file};
use ingest_telemetry::LogFormat;

/// List incoming check images and hand each one to the save action.
#[derive(Debug, Parser)]
#[command(name = "ingest", version)]
pub struct Cli {
    /// JSON file holding the invocation parameters.
    #[arg(long, value_name = "FILE", conflicts_with = "params_json")]
    pub params: Option<PathBuf>,
    /// Inline JSON invocation parameters.
    #[arg(long, value_name = "JSON")]
    pub params_json: Option<String>,
    /// Log output format (`json` or `pretty`); defaults by build profile.
    #[arg(long, env = "INGEST_LOG_FORMAT", value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,
    /// Write Prometheus metrics to this file when the run ends.
    #[arg(long, env = "INGEST_METRICS_FILE", value_name = "FILE")]
    pub metrics_file: Option<PathBuf>,
    /// Per-request HTTP timeout in seconds, overriding `INGEST_HTTP_TIMEOUT_SECS`.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Load the parameter document named on the command line, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be read or parsed.
    pub fn parameters(&self) -> ConfigResult<Parameters> {
        if let Some(path) = &self.params {
            return read_params_file(path);
        }
        self.params_json
            .as_deref()
            .map_or_else(|| Ok(Parameters::new()), parse_params)
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse()
}
