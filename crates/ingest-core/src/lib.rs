//! Adapter-agnostic ingestion interfaces and DTOs.
//!
//! The dispatch pipeline only ever talks to the object store and the action
//! runtime through the two traits below, so production adapters and test
//! fakes are interchangeable.

pub mod error;
pub mod model;

use async_trait::async_trait;

pub use error::{BoxedSource, ResponseError, StorageError, StorageResult, render_chain};
pub use model::{
    Credentials, DispatchRecord, FileDescriptor, InvocationOutcome, InvocationPayload,
    PipelineResult, PipelineStatus, Region, Session, project_base_url,
};

/// Object storage capability set used by the dispatch pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Exchange credentials for a session scoped to the credential's project.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] when the region cannot be
    /// resolved (before any I/O) and [`StorageError::Auth`] when the token
    /// exchange fails.
    async fn authenticate(&self, credentials: &Credentials) -> StorageResult<Session>;

    /// List the objects currently stored in `container`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] on transport failure, a non-success
    /// status, or an undecodable body.
    async fn list_files(
        &self,
        session: &Session,
        container: &str,
    ) -> StorageResult<Vec<FileDescriptor>>;
}

/// Asynchronous entry point into the action execution runtime.
///
/// Implementations never fail the call itself: every expected failure is
/// reported as [`InvocationOutcome::Failure`].
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    /// Submit `payload` to `action` and report the resulting outcome.
    async fn invoke(&self, action: &str, payload: &InvocationPayload) -> InvocationOutcome;
}
