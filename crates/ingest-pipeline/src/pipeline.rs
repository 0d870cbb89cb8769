//! Orchestration of one ingest run.
//!
//! # Design
//! - The pipeline holds no per-run state; every call to [`DispatchPipeline::run`]
//!   authenticates afresh and builds its own report.
//! - Invocations are issued together and joined. `join_all` yields outcomes in
//!   input order, so records line up with the listing without extra bookkeeping.
//! - Failures never short-circuit the fan-out: every invocation finishes before
//!   the outcomes are aggregated.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use ingest_core::{
    ActionInvoker, Credentials, DispatchRecord, FileDescriptor, InvocationOutcome,
    InvocationPayload, ObjectStore, PipelineResult, PipelineStatus, render_chain,
};
use ingest_telemetry::{Metrics, build_sha};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::stage::Stage;

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Storage credentials, region included.
    pub credentials: Credentials,
    /// Container holding the incoming check images.
    pub container: String,
    /// Action invoked once per listed file.
    pub action: String,
    /// Correlation id attached to every log line of the run.
    pub run_id: String,
}

impl DispatchRequest {
    /// Request with a freshly generated run id.
    pub fn new(
        credentials: Credentials,
        container: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            container: container.into(),
            action: action.into(),
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Replace the generated run id.
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// Value handed back to the caller.
    pub result: PipelineResult,
    /// Typed cause when the run failed.
    pub error: Option<PipelineError>,
    /// Stages visited, in order, ending with `Done`.
    pub stages: Vec<Stage>,
    /// One record per listed file, in listing order.
    pub records: Vec<DispatchRecord>,
    /// Number of files the listing returned.
    pub files_listed: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl PipelineReport {
    /// Last stage the run reached.
    #[must_use]
    pub fn final_stage(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Idle)
    }

    /// Invocations that produced an activation.
    #[must_use]
    pub fn activations(&self) -> usize {
        self.records
            .iter()
            .filter(|record| !record.outcome.is_failure())
            .count()
    }

    /// Invocations that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.records.len() - self.activations()
    }
}

/// Runs the authenticate, list, and dispatch sequence against injected adapters.
pub struct DispatchPipeline {
    store: Arc<dyn ObjectStore>,
    invoker: Arc<dyn ActionInvoker>,
    metrics: Metrics,
}

impl DispatchPipeline {
    /// Build a pipeline over the given adapters.
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        invoker: Arc<dyn ActionInvoker>,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            invoker,
            metrics,
        }
    }

    /// Execute one run. Failures are reported in the returned report, never
    /// raised.
    pub async fn run(&self, request: &DispatchRequest) -> PipelineReport {
        let span = info_span!(
            "run",
            run_id = %request.run_id,
            container = %request.container,
            action = %request.action,
            build_sha = %build_sha()
        );
        self.execute(request).instrument(span).await
    }

    async fn execute(&self, request: &DispatchRequest) -> PipelineReport {
        let mut run = RunProgress::start();

        run.advance(Stage::Authenticating);
        let session = match self.store.authenticate(&request.credentials).await {
            Ok(session) => session,
            Err(err) => {
                let error = PipelineError::from_storage(Stage::Authenticating, err);
                return self.finish(run, Some(error));
            }
        };

        run.advance(Stage::Listing);
        let files = match self.store.list_files(&session, &request.container).await {
            Ok(files) => files,
            Err(err) => {
                let error = PipelineError::from_storage(Stage::Listing, err);
                return self.finish(run, Some(error));
            }
        };
        run.files_listed = files.len();
        self.metrics.set_files_listed(files.len());
        info!(files = files.len(), "container listed");

        run.advance(Stage::Dispatching);
        run.records = self.dispatch(&request.action, &files).await;

        run.advance(Stage::Aggregating);
        let failure = first_failure(&run.records);
        self.finish(run, failure)
    }

    async fn dispatch(&self, action: &str, files: &[FileDescriptor]) -> Vec<DispatchRecord> {
        join_all(files.iter().map(|file| self.invoke_one(action, file))).await
    }

    async fn invoke_one(&self, action: &str, file: &FileDescriptor) -> DispatchRecord {
        let payload = InvocationPayload::from(file);
        let outcome = self.invoker.invoke(action, &payload).await;
        match &outcome {
            InvocationOutcome::Activation { id, .. } => {
                self.metrics.inc_invocation("activation");
                debug!(file = %file.name, activation_id = %id, "file dispatched");
            }
            InvocationOutcome::Failure { reason } => {
                self.metrics.inc_invocation("failure");
                debug!(file = %file.name, reason = %reason, "file dispatch failed");
            }
        }
        DispatchRecord {
            file_name: file.name.clone(),
            outcome,
        }
    }

    fn finish(&self, mut run: RunProgress, error: Option<PipelineError>) -> PipelineReport {
        let result = match &error {
            None => PipelineResult::success(),
            Some(err) => {
                let stage = match err {
                    PipelineError::Invocation { .. } => Stage::Dispatching,
                    _ => run.current(),
                };
                let details = render_chain(err);
                self.metrics.inc_stage_failure(stage.as_str());
                warn!(
                    stage = stage.as_str(),
                    kind = err.kind(),
                    error = %details,
                    "run failed"
                );
                PipelineResult::failure(details)
            }
        };

        run.advance(Stage::Done(result.status));
        let elapsed = run.started.elapsed();
        self.metrics.inc_run(status_label(result.status));
        self.metrics.observe_run_duration(elapsed);

        let report = PipelineReport {
            result,
            error,
            stages: run.stages,
            records: run.records,
            files_listed: run.files_listed,
            elapsed,
        };
        info!(
            status = status_label(report.result.status),
            files = report.files_listed,
            activations = report.activations(),
            failures = report.failures(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "run finished"
        );
        report
    }
}

struct RunProgress {
    stages: Vec<Stage>,
    records: Vec<DispatchRecord>,
    files_listed: usize,
    started: Instant,
}

impl RunProgress {
    fn start() -> Self {
        Self {
            stages: vec![Stage::Idle],
            records: Vec::new(),
            files_listed: 0,
            started: Instant::now(),
        }
    }

    fn current(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Idle)
    }

    fn advance(&mut self, next: Stage) {
        let current = self.current();
        debug_assert!(
            current.can_advance_to(next),
            "illegal stage transition {current} -> {next}"
        );
        info!(from = current.as_str(), to = next.as_str(), "stage transition");
        self.stages.push(next);
    }
}

fn first_failure(records: &[DispatchRecord]) -> Option<PipelineError> {
    records.iter().find_map(|record| {
        record
            .outcome
            .failure_reason()
            .map(|reason| PipelineError::Invocation {
                file_name: record.file_name.clone(),
                reason: reason.to_string(),
            })
    })
}

const fn status_label(status: PipelineStatus) -> &'static str {
    match status {
        PipelineStatus::Success => "success",
        PipelineStatus::Failure => "failure",
    }
}
