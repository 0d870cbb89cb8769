//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Collectors are registered once on a private registry; the job is
//!   short-lived, so values are flushed to a textfile rather than scraped.
//! - Label values are the stable `as_str` names of the pipeline's own enums.

use std::convert::TryFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry for one ingest process.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    runs_total: IntCounterVec,
    invocations_total: IntCounterVec,
    stage_failures_total: IntCounterVec,
    files_listed: IntGauge,
    run_duration_ms: IntGauge,
}

/// Snapshot of the run-level gauges and counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Runs that finished with `Success`.
    pub runs_succeeded: u64,
    /// Runs that finished with `Failure`.
    pub runs_failed: u64,
    /// Invocations that produced an activation.
    pub activations: u64,
    /// Invocations that failed.
    pub invocation_failures: u64,
    /// Files returned by the most recent listing.
    pub files_listed: i64,
    /// Wall-clock duration of the most recent run (ms).
    pub run_duration_ms: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the ingest collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let runs_total = counter_vec(
            "ingest_runs_total",
            "Completed ingest runs by final status",
            &["status"],
        )?;
        let invocations_total = counter_vec(
            "ingest_invocations_total",
            "Save-action invocations by outcome",
            &["outcome"],
        )?;
        let stage_failures_total = counter_vec(
            "ingest_stage_failures_total",
            "Runs that failed, by the stage that failed",
            &["stage"],
        )?;
        let files_listed = gauge(
            "ingest_files_listed",
            "Files returned by the most recent container listing",
        )?;
        let run_duration_ms = gauge(
            "ingest_run_duration_ms",
            "Wall-clock duration of the most recent run (ms)",
        )?;

        register(&registry, "ingest_runs_total", runs_total.clone())?;
        register(&registry, "ingest_invocations_total", invocations_total.clone())?;
        register(
            &registry,
            "ingest_stage_failures_total",
            stage_failures_total.clone(),
        )?;
        register(&registry, "ingest_files_listed", files_listed.clone())?;
        register(&registry, "ingest_run_duration_ms", run_duration_ms.clone())?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                runs_total,
                invocations_total,
                stage_failures_total,
                files_listed,
                run_duration_ms,
            }),
        })
    }

    /// Count a finished run under its final status (`success` or `failure`).
    pub fn inc_run(&self, status: &str) {
        self.inner.runs_total.with_label_values(&[status]).inc();
    }

    /// Count one invocation under its outcome (`activation` or `failure`).
    pub fn inc_invocation(&self, outcome: &str) {
        self.inner
            .invocations_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Count a run failure attributed to `stage`.
    pub fn inc_stage_failure(&self, stage: &str) {
        self.inner
            .stage_failures_total
            .with_label_values(&[stage])
            .inc();
    }

    /// Record how many files the listing returned.
    pub fn set_files_listed(&self, count: usize) {
        self.inner
            .files_listed
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record the wall-clock duration of a run.
    pub fn observe_run_duration(&self, duration: Duration) {
        self.inner
            .run_duration_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Render the registry and replace `path` with the result.
    ///
    /// The text is written to a sibling temporary file first and renamed into
    /// place, so a collector never reads a partial file.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the file cannot be written.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let rendered = self.render()?;
        let staging = staging_path(path);
        std::fs::write(&staging, rendered.as_bytes()).map_err(|source| {
            TelemetryError::MetricsWrite {
                path: staging.clone(),
                source,
            }
        })?;
        std::fs::rename(&staging, path).map_err(|source| TelemetryError::MetricsWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Take a point-in-time snapshot of the run-level metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let runs = &self.inner.runs_total;
        let invocations = &self.inner.invocations_total;
        MetricsSnapshot {
            runs_succeeded: runs.with_label_values(&["success"]).get(),
            runs_failed: runs.with_label_values(&["failure"]).get(),
            activations: invocations.with_label_values(&["activation"]).get(),
            invocation_failures: invocations.with_label_values(&["failure"]).get(),
            files_listed: self.inner.files_listed.get(),
            run_duration_ms: self.inner.run_duration_ms.get(),
        }
    }

    /// Current count of failures attributed to `stage`.
    #[must_use]
    pub fn stage_failures(&self, stage: &str) -> u64 {
        self.inner
            .stage_failures_total
            .with_label_values(&[stage])
            .get()
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn gauge(name: &'static str, help: &str) -> Result<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: C) -> Result<()>
where
    C: Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    PathBuf::from(staging)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn duration_to_ms_saturates_on_large_values() {
        let duration = Duration::from_secs(u64::MAX / 2);
        assert_eq!(Metrics::duration_to_ms(duration), i64::MAX);
    }

    #[test]
    fn metrics_snapshot_reflects_updates() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_run("success");
        metrics.inc_run("failure");
        metrics.inc_run("failure");
        metrics.inc_invocation("activation");
        metrics.inc_invocation("failure");
        metrics.inc_stage_failure("listing");
        metrics.set_files_listed(3);
        metrics.observe_run_duration(Duration::from_millis(250));

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                runs_succeeded: 1,
                runs_failed: 2,
                activations: 1,
                invocation_failures: 1,
                files_listed: 3,
                run_duration_ms: 250,
            }
        );
        assert_eq!(metrics.stage_failures("listing"), 1);
        assert_eq!(metrics.stage_failures("authenticating"), 0);

        let rendered = metrics.render()?;
        assert!(rendered.contains("ingest_runs_total{status=\"failure\"} 2"));
        assert!(rendered.contains("ingest_files_listed 3"));
        assert!(rendered.contains("ingest_stage_failures_total{stage=\"listing\"} 1"));
        Ok(())
    }

    #[test]
    fn registries_are_independent_per_instance() -> Result<()> {
        let first = Metrics::new()?;
        let second = Metrics::new()?;
        first.inc_run("success");
        assert_eq!(first.snapshot().runs_succeeded, 1);
        assert_eq!(second.snapshot(), MetricsSnapshot::default());
        Ok(())
    }

    #[test]
    fn write_textfile_replaces_target() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ingest.prom");
        std::fs::write(&path, "stale")?;

        let metrics = Metrics::new()?;
        metrics.inc_invocation("activation");
        metrics.write_textfile(&path)?;

        let written = std::fs::read_to_string(&path)?;
        assert!(written.contains("ingest_invocations_total{outcome=\"activation\"} 1"));
        assert!(!written.contains("stale"));
        assert!(!staging_path(&path).exists());
        Ok(())
    }

    #[test]
    fn write_textfile_reports_missing_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing").join("ingest.prom");
        let metrics = Metrics::new()?;
        let err = metrics
            .write_textfile(&path)
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected write failure"))?;
        assert!(matches!(err, TelemetryError::MetricsWrite { .. }));
        Ok(())
    }
}
