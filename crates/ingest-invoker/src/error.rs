//! # Design
//!
//! - `InvokerError` covers static problems found while building the invoker
//!   or addressing an action.
//! - `InvocationError` covers everything that can go wrong during one call; it
//!   never escapes the crate and is flattened into an `InvocationOutcome`.

use thiserror::Error;

/// Errors raised while configuring the invoker or addressing an action.
#[derive(Debug, Error)]
pub enum InvokerError {
    /// Action identifier could not be parsed.
    #[error("invalid action name '{value}': {reason}")]
    InvalidActionName {
        /// Identifier supplied by the caller.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Runtime API host could not be turned into a base URL.
    #[error("invalid runtime API host '{value}'")]
    InvalidApiHost {
        /// Host value supplied by the caller.
        value: String,
    },
    /// Runtime API key was not of the form `user:secret`.
    #[error("runtime API key must be formatted as user:secret")]
    InvalidApiKey,
}

/// Convenience alias for invoker construction results.
pub type InvokerResult<T> = Result<T, InvokerError>;

/// Failure of a single invocation.
#[derive(Debug, Error)]
pub(crate) enum InvocationError {
    #[error("action '{action}' could not be addressed")]
    Address {
        action: String,
        #[source]
        source: InvokerError,
    },
    #[error("runtime request for '{action}' timed out")]
    Timeout { action: String },
    #[error("runtime request for '{action}' failed")]
    Transport {
        action: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("action '{action}' not found")]
    NotFound { action: String },
    #[error("runtime rejected '{action}' with status {status}: {message}")]
    Rejected {
        action: String,
        status: u16,
        message: String,
    },
    #[error("runtime response for '{action}' was malformed")]
    MalformedBody {
        action: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("runtime response for '{action}' carried no activation id")]
    MissingActivationId { action: String },
}
