//! Parameter names and defaults.
//!
//! Every name is looked up first in the invocation parameters and then in the
//! process environment.

/// Storage region (`dallas` or `london`).
pub const REGION: &str = "OBJECT_STORAGE_REGION_NAME";
/// Storage project id.
pub const PROJECT_ID: &str = "OBJECT_STORAGE_PROJECT_ID";
/// Storage user id.
pub const USER_ID: &str = "OBJECT_STORAGE_USER_ID";
/// Storage password.
pub const PASSWORD: &str = "OBJECT_STORAGE_PASSWORD";
/// Container holding incoming check images.
pub const INCOMING_CONTAINER: &str = "OBJECT_STORAGE_INCOMING_CONTAINER_NAME";
/// Identity endpoint override.
pub const AUTH_URL: &str = "OBJECT_STORAGE_AUTH_URL";
/// Action invoked once per file.
pub const SAVE_ACTION_NAME: &str = "SAVE_ACTION_NAME";
/// Per-request HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: &str = "INGEST_HTTP_TIMEOUT_SECS";
/// Action runtime API host.
pub const RUNTIME_API_HOST: &str = "__OW_API_HOST";
/// Action runtime API key (`user:secret`).
pub const RUNTIME_API_KEY: &str = "__OW_API_KEY";
/// Namespace the runtime resolves `_` to.
pub const RUNTIME_NAMESPACE: &str = "__OW_NAMESPACE";

/// Action invoked when `SAVE_ACTION_NAME` is not set.
pub const DEFAULT_SAVE_ACTION: &str = "/_/openchecks/save-check-images";
/// HTTP timeout used when `INGEST_HTTP_TIMEOUT_SECS` is not set.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Parameters a run cannot start without, in reporting order.
pub const REQUIRED: [&str; 7] = [
    REGION,
    PROJECT_ID,
    USER_ID,
    PASSWORD,
    INCOMING_CONTAINER,
    RUNTIME_API_HOST,
    RUNTIME_API_KEY,
];

/// Parameters whose values must never be logged or echoed back.
pub const SECRET: [&str; 2] = [PASSWORD, RUNTIME_API_KEY];
