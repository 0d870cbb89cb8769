//! Error types for object storage operations.

use std::error::Error;

use thiserror::Error;

/// Boxed source error carried by storage failures.
pub type BoxedSource = Box<dyn Error + Send + Sync>;

/// Primary error type for object storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Static configuration was unusable; raised before any network call.
    #[error("invalid storage configuration for {field}: {reason}")]
    Configuration {
        /// Name of the offending setting.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when it is safe to report.
        value: Option<String>,
    },
    /// The token exchange with the identity service failed.
    #[error("storage authentication against {url} failed")]
    Auth {
        /// Identity endpoint that was called.
        url: String,
        /// Underlying failure.
        #[source]
        source: BoxedSource,
    },
    /// Listing the container failed or returned unusable data.
    #[error("listing container '{container}' failed")]
    List {
        /// Container that was being listed.
        container: String,
        /// Underlying failure.
        #[source]
        source: BoxedSource,
    },
}

impl StorageError {
    /// Build a configuration error.
    #[must_use]
    pub const fn configuration(
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::Configuration {
            field,
            reason,
            value,
        }
    }

    /// Build an authentication error from any source.
    pub fn auth(url: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self::Auth {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Build a listing error from any source.
    pub fn list(container: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self::List {
            container: container.into(),
            source: source.into(),
        }
    }

    /// Short label for the failure class, used in logs and metric labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Auth { .. } => "auth",
            Self::List { .. } => "list",
        }
    }
}

/// Protocol-level problems with an HTTP response that otherwise arrived intact.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status}")]
    Status {
        /// Status code returned by the server.
        status: u16,
        /// Response body, when one was readable.
        body: Option<String>,
    },
    /// A required response header was absent or not valid text.
    #[error("response header '{name}' missing or invalid")]
    MissingHeader {
        /// Header name that was expected.
        name: &'static str,
    },
    /// The response body could not be decoded.
    #[error("response body was malformed")]
    MalformedBody {
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience alias for storage results.
pub type StorageResult<T> = Result<T, StorageError>;

/// Render an error followed by each of its sources, separated by `: `.
#[must_use]
pub fn render_chain(error: &(dyn Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut current = error.source();
    while let Some(source) = current {
        rendered.push_str(": ");
        rendered.push_str(&source.to_string());
        current = source.source();
    }
    rendered
}
