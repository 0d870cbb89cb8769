//! Run-fatal errors.
//!
//! # Design
//! - One variant per way a run can fail, so callers can map them to exit
//!   codes without string matching.
//! - Storage failures keep the adapter error as their source.

use ingest_core::StorageError;
use thiserror::Error;

use crate::stage::Stage;

/// Reason a run finished with `Failure`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Credentials or container could not be used before any I/O.
    #[error("run configuration rejected")]
    Configuration {
        /// Adapter error describing the rejected field.
        #[source]
        source: StorageError,
    },
    /// Token exchange failed.
    #[error("authentication failed")]
    Auth {
        /// Adapter error.
        #[source]
        source: StorageError,
    },
    /// Container listing failed.
    #[error("listing failed")]
    List {
        /// Adapter error.
        #[source]
        source: StorageError,
    },
    /// At least one invocation failed; carries the first in listing order.
    #[error("invocation for '{file_name}' failed: {reason}")]
    Invocation {
        /// File whose invocation failed.
        file_name: String,
        /// Failure reported by the invoker.
        reason: String,
    },
}

impl PipelineError {
    /// Classify a storage error raised while the run was in `stage`.
    ///
    /// Configuration problems keep their kind whichever stage surfaced them.
    #[must_use]
    pub fn from_storage(stage: Stage, source: StorageError) -> Self {
        if matches!(source, StorageError::Configuration { .. }) {
            Self::Configuration { source }
        } else if stage == Stage::Listing {
            Self::List { source }
        } else {
            Self::Auth { source }
        }
    }

    /// Stable lowercase label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Auth { .. } => "auth",
            Self::List { .. } => "list",
            Self::Invocation { .. } => "invocation",
        }
    }

    /// Whether the failure came from unusable input rather than a remote call.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_core::render_chain;

    #[test]
    fn storage_errors_are_classified_by_stage() {
        let auth = PipelineError::from_storage(
            Stage::Authenticating,
            StorageError::auth("https://identity", "denied"),
        );
        assert_eq!(auth.kind(), "auth");

        let list =
            PipelineError::from_storage(Stage::Listing, StorageError::list("incoming", "down"));
        assert_eq!(list.kind(), "list");

        let configuration = PipelineError::from_storage(
            Stage::Listing,
            StorageError::configuration("container", "empty", None),
        );
        assert!(configuration.is_configuration());
    }

    #[test]
    fn rendered_chain_names_the_cause() {
        let err = PipelineError::from_storage(
            Stage::Authenticating,
            StorageError::auth("https://identity", "denied"),
        );
        assert_eq!(
            render_chain(&err),
            "authentication failed: storage authentication against https://identity failed: denied"
        );

        let invocation = PipelineError::Invocation {
            file_name: "chk2.png".into(),
            reason: "boom".into(),
        };
        assert_eq!(invocation.to_string(), "invocation for 'chk2.png' failed: boom");
    }
}
