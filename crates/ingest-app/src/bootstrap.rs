//! Run wiring: parameters, HTTP client, adapters, pipeline, and the final
//! result document.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use ingest_config::IngestConfig;
use ingest_core::render_chain;
use ingest_invoker::OpenWhiskInvoker;
use ingest_pipeline::{DispatchPipeline, DispatchRequest};
use ingest_storage::SwiftObjectStore;
use ingest_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, Metrics, init_logging};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cli::Cli;
use crate::error::{AppError, AppResult};

const HEADER_REQUEST_ID: &str = "x-request-id";

/// Install logging, perform one run against the process environment, print
/// the result document, and return the exit code.
pub async fn run(cli: Cli) -> ExitCode {
    let logging = LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_sha: option_env!("INGEST_BUILD_SHA").unwrap_or("dev"),
    };
    let outcome = match init_logging(&logging) {
        Ok(()) => execute(&cli, |name| std::env::var(name).ok()).await,
        Err(source) => Err(AppError::telemetry("telemetry.init", source)),
    };

    let (document, code) = outcome_document(&outcome);
    println!("{document}");
    ExitCode::from(code)
}

/// Result document and exit code for a finished run.
#[must_use]
pub fn outcome_document(outcome: &AppResult<()>) -> (Value, u8) {
    match outcome {
        Ok(()) => (json!({ "status": "Success" }), 0),
        Err(err) => (json!({ "error": render_chain(err) }), err.exit_code()),
    }
}

/// Perform one run, resolving parameters through `env` after the command-line
/// document. Metrics are written to `--metrics-file` whatever the outcome.
///
/// # Errors
///
/// Returns an error when configuration is unusable, an adapter cannot be
/// built, or the run finishes with `Failure`.
pub async fn execute<F>(cli: &Cli, env: F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String> + Send,
{
    let metrics = Metrics::new().map_err(|source| AppError::telemetry("metrics.init", source))?;
    let outcome = execute_with(cli, env, &metrics).await;

    if let Some(path) = &cli.metrics_file
        && let Err(err) = metrics.write_textfile(path)
    {
        warn!(error = %render_chain(&err), "failed to write metrics textfile");
    }
    outcome
}

async fn execute_with<F>(cli: &Cli, env: F, metrics: &Metrics) -> AppResult<()>
where
    F: Fn(&str) -> Option<String> + Send,
{
    let (config, pipeline, request) = match prepare(cli, env, metrics) {
        Ok(prepared) => prepared,
        Err(err) => {
            metrics.inc_stage_failure("configuration");
            metrics.inc_run("failure");
            return Err(err);
        }
    };

    info!(
        region = config.region.as_str(),
        container = %config.container,
        action = %config.save_action,
        timeout_secs = config.http_timeout.as_secs(),
        "starting ingest run"
    );
    let report = pipeline.run(&request).await;
    report
        .error
        .map_or(Ok(()), |source| Err(AppError::Run { source }))
}

fn prepare<F>(
    cli: &Cli,
    env: F,
    metrics: &Metrics,
) -> AppResult<(IngestConfig, DispatchPipeline, DispatchRequest)>
where
    F: Fn(&str) -> Option<String>,
{
    let config = resolve_config(cli, env)?;
    let run_id = Uuid::new_v4().to_string();
    let client = build_client(config.http_timeout, &run_id)?;
    let pipeline = build_pipeline(&config, client, metrics.clone())?;
    let request = DispatchRequest::new(
        config.credentials.clone(),
        config.container.clone(),
        config.save_action.to_string(),
    )
    .with_run_id(run_id);
    Ok((config, pipeline, request))
}

fn resolve_config<F>(cli: &Cli, env: F) -> AppResult<IngestConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let params = cli
        .parameters()
        .map_err(|source| AppError::config("config.params", source))?;
    let mut config = IngestConfig::resolve(&params, env)
        .map_err(|source| AppError::config("config.resolve", source))?;
    if let Some(secs) = cli.timeout {
        config.http_timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

fn build_client(timeout: Duration, run_id: &str) -> AppResult<Client> {
    let mut default_headers = HeaderMap::new();
    let request_id = HeaderValue::from_str(run_id).map_err(|_| AppError::InvalidRequestId {
        value: run_id.to_string(),
    })?;
    default_headers.insert(HEADER_REQUEST_ID, request_id);

    Client::builder()
        .timeout(timeout)
        .default_headers(default_headers)
        .build()
        .map_err(|source| AppError::Http {
            operation: "http.client",
            source,
        })
}

fn build_pipeline(
    config: &IngestConfig,
    client: Client,
    metrics: Metrics,
) -> AppResult<DispatchPipeline> {
    let store = match &config.identity_url {
        Some(url) => SwiftObjectStore::with_identity_url(client.clone(), url.clone()),
        None => SwiftObjectStore::new(client.clone())
            .map_err(|source| AppError::storage("storage.init", source))?,
    };

    let mut invoker = OpenWhiskInvoker::new(
        client,
        &config.runtime.api_host,
        config.runtime.api_key.clone(),
    )
    .map_err(|source| AppError::invoker("invoker.init", source))?;
    if let Some(namespace) = &config.runtime.namespace {
        invoker = invoker.with_namespace(namespace.clone());
    }

    Ok(DispatchPipeline::new(
        Arc::new(store),
        Arc::new(invoker),
        metrics,
    ))
}
