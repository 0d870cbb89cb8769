//! DTOs exchanged between the storage client, the action invoker, and the pipeline.

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{StorageError, StorageResult};

const REDACTED: &str = "<redacted>";

/// Supported object storage regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Dallas data centre.
    Dallas,
    /// London data centre.
    London,
}

impl Region {
    /// Every region the storage client can resolve.
    pub const ALL: [Self; 2] = [Self::Dallas, Self::London];

    /// Parameter spelling of the region.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dallas => "dallas",
            Self::London => "london",
        }
    }

    /// Object storage host serving this region.
    #[must_use]
    pub const fn storage_host(self) -> &'static str {
        match self {
            Self::Dallas => "dal.objectstorage.open.softlayer.com",
            Self::London => "lon.objectstorage.open.softlayer.com",
        }
    }

    /// Base URL for `project_id` in this region, always ending in `/`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] when the project id is empty or
    /// cannot form a single path segment.
    pub fn base_url(self, project_id: &str) -> StorageResult<Url> {
        let root = format!("https://{}/", self.storage_host());
        let root = Url::parse(&root)
            .map_err(|_| StorageError::configuration("region", "invalid_storage_host", None))?;
        project_base_url(&root, project_id)
    }
}

/// Build `{root}v1/AUTH_{project_id}/` for an arbitrary storage root.
///
/// # Errors
///
/// Returns [`StorageError::Configuration`] when the project id is empty or
/// would escape its path segment.
pub fn project_base_url(root: &Url, project_id: &str) -> StorageResult<Url> {
    let project_id = project_id.trim();
    if project_id.is_empty() {
        return Err(StorageError::configuration("project_id", "empty", None));
    }
    if project_id.contains(['/', '?', '#']) {
        return Err(StorageError::configuration(
            "project_id",
            "invalid_characters",
            Some(project_id.to_string()),
        ));
    }
    root.join(&format!("v1/AUTH_{project_id}/")).map_err(|_| {
        StorageError::configuration(
            "project_id",
            "invalid_characters",
            Some(project_id.to_string()),
        )
    })
}

impl FromStr for Region {
    type Err = StorageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|region| region.as_str() == value)
            .ok_or_else(|| {
                StorageError::configuration(
                    "region",
                    "unsupported_region",
                    Some(value.to_string()),
                )
            })
    }
}

impl Display for Region {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Storage credentials supplied for a single run. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Region identifier as supplied by the caller (`dallas`, `london`).
    pub region: String,
    /// Project the session is scoped to.
    pub project_id: String,
    /// Identity service user id.
    pub user_id: String,
    /// Identity service password.
    pub password: String,
}

impl Credentials {
    /// Construct credentials from their parts.
    pub fn new(
        region: impl Into<String>,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    /// Resolve the region string into a supported [`Region`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] for any region outside
    /// [`Region::ALL`].
    pub fn region(&self) -> StorageResult<Region> {
        self.region.parse()
    }
}

impl Debug for Credentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("region", &self.region)
            .field("project_id", &self.project_id)
            .field("user_id", &self.user_id)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Authenticated storage session, valid for one pipeline run.
#[derive(Clone)]
pub struct Session {
    base_url: Url,
    auth_token: String,
}

impl Session {
    /// Pair a project base URL with the token issued for it.
    pub fn new(base_url: Url, auth_token: impl Into<String>) -> Self {
        Self {
            base_url,
            auth_token: auth_token.into(),
        }
    }

    /// Project base URL; container names are joined onto it.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Token sent as `X-Auth-Token` on storage requests.
    #[must_use]
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

impl Debug for Session {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("auth_token", &REDACTED)
            .finish()
    }
}

/// Listing-time snapshot of one object in a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Object name, unique within the container.
    pub name: String,
    /// MIME type recorded by the store.
    pub content_type: String,
    /// Last-modified timestamp exactly as the store reported it.
    pub last_modified: String,
}

impl FileDescriptor {
    /// Construct a descriptor from its parts.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        last_modified: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            last_modified: last_modified.into(),
        }
    }
}

/// Parameters handed to the downstream action for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationPayload {
    /// Object name within the incoming container.
    pub file_name: String,
    /// MIME type of the object.
    pub content_type: String,
    /// Last-modified timestamp of the object.
    pub last_modified: String,
}

impl From<&FileDescriptor> for InvocationPayload {
    fn from(file: &FileDescriptor) -> Self {
        Self {
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
            last_modified: file.last_modified.clone(),
        }
    }
}

/// Result of a single downstream invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The runtime accepted the call and recorded an activation.
    Activation {
        /// Activation identifier assigned by the runtime.
        id: String,
        /// Raw activation record returned by the runtime.
        response: Value,
    },
    /// The call could not be completed.
    Failure {
        /// Human-readable cause.
        reason: String,
    },
}

impl InvocationOutcome {
    /// Shorthand for a failure outcome.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Whether the outcome is a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Activation identifier, when the call succeeded.
    #[must_use]
    pub fn activation_id(&self) -> Option<&str> {
        match self {
            Self::Activation { id, .. } => Some(id),
            Self::Failure { .. } => None,
        }
    }

    /// Failure reason, when the call failed.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Activation { .. } => None,
            Self::Failure { reason } => Some(reason),
        }
    }
}

/// Outcome correlated back to the file that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Name of the originating file.
    pub file_name: String,
    /// Outcome reported by the invoker.
    pub outcome: InvocationOutcome,
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    /// Every step and every invocation succeeded.
    Success,
    /// At least one step or invocation failed.
    Failure,
}

/// Single value handed back to the caller of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Terminal status.
    pub status: PipelineStatus,
    /// Cause of the first failure; absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PipelineResult {
    /// Successful result.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            status: PipelineStatus::Success,
            details: None,
        }
    }

    /// Failed result carrying its cause.
    pub fn failure(details: impl Into<String>) -> Self {
        Self {
            status: PipelineStatus::Failure,
            details: Some(details.into()),
        }
    }

    /// Whether the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Success
    }
}
