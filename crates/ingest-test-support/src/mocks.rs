//! In-memory fakes for the object store and the action runtime.
//!
//! Both fakes record every call so tests can assert on what the pipeline
//! attempted, not only on what it returned.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use ingest_core::{
    ActionInvoker, Credentials, FileDescriptor, InvocationOutcome, InvocationPayload, ObjectStore,
    Session, StorageError, StorageResult,
};
use serde_json::json;

/// Token issued by [`StaticObjectStore`].
pub const FAKE_TOKEN: &str = "fake-token";

/// Call observed by [`StaticObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `authenticate` was called for this region.
    Authenticate {
        /// Region string from the credentials.
        region: String,
    },
    /// `list_files` was called for this container.
    List {
        /// Container that was requested.
        container: String,
        /// Token presented with the request.
        token: String,
    },
}

/// Object store that serves a fixed listing, optionally failing a step.
#[derive(Debug, Default)]
pub struct StaticObjectStore {
    files: Vec<FileDescriptor>,
    auth_failure: Option<String>,
    list_failure: Option<String>,
    calls: Mutex<Vec<StoreCall>>,
}

impl StaticObjectStore {
    /// Store whose container always lists `files`.
    #[must_use]
    pub fn with_files(files: Vec<FileDescriptor>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    /// Store whose token exchange always fails with `reason`.
    pub fn failing_auth(reason: impl Into<String>) -> Self {
        Self {
            auth_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Store that authenticates but fails every listing with `reason`.
    pub fn failing_list(reason: impl Into<String>) -> Self {
        Self {
            list_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Calls observed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl ObjectStore for StaticObjectStore {
    async fn authenticate(&self, credentials: &Credentials) -> StorageResult<Session> {
        self.record(StoreCall::Authenticate {
            region: credentials.region.clone(),
        });
        let base_url = credentials.region()?.base_url(&credentials.project_id)?;
        if let Some(reason) = &self.auth_failure {
            return Err(StorageError::auth("memory://identity", reason.clone()));
        }
        Ok(Session::new(base_url, FAKE_TOKEN))
    }

    async fn list_files(
        &self,
        session: &Session,
        container: &str,
    ) -> StorageResult<Vec<FileDescriptor>> {
        self.record(StoreCall::List {
            container: container.to_string(),
            token: session.auth_token().to_string(),
        });
        if let Some(reason) = &self.list_failure {
            return Err(StorageError::list(container, reason.clone()));
        }
        Ok(self.files.clone())
    }
}

/// Invocation observed by [`RecordingInvoker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedInvocation {
    /// Action identifier passed by the caller.
    pub action: String,
    /// Payload passed by the caller.
    pub payload: InvocationPayload,
}

/// Action runtime that records payloads and answers from a script.
///
/// Files without a scripted failure receive an activation with id
/// `act-<file name>`.
#[derive(Debug, Default)]
pub struct RecordingInvoker {
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<RecordedInvocation>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl RecordingInvoker {
    /// Invoker that activates every file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail invocations for `file_name` with `reason`.
    #[must_use]
    pub fn fail_file(mut self, file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.failures.insert(file_name.into(), reason.into());
        self
    }

    /// Hold invocations for `file_name` for `delay` before answering.
    #[must_use]
    pub fn delay_file(mut self, file_name: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(file_name.into(), delay);
        self
    }

    /// Invocations observed so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedInvocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Payloads observed so far, in call order.
    #[must_use]
    pub fn payloads(&self) -> Vec<InvocationPayload> {
        self.calls().into_iter().map(|call| call.payload).collect()
    }

    /// Highest number of invocations that were pending at the same time.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionInvoker for RecordingInvoker {
    async fn invoke(&self, action: &str, payload: &InvocationPayload) -> InvocationOutcome {
        let pending = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(pending, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedInvocation {
                action: action.to_string(),
                payload: payload.clone(),
            });

        if let Some(delay) = self.delays.get(&payload.file_name) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.failures.get(&payload.file_name) {
            Some(reason) => InvocationOutcome::failure(reason.clone()),
            None => {
                let id = format!("act-{}", payload.file_name);
                InvocationOutcome::Activation {
                    response: json!({ "activationId": id }),
                    id,
                }
            }
        }
    }
}
