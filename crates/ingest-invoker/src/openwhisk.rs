//! Non-blocking action invocation against the OpenWhisk REST API.

use std::fmt::{self, Debug, Formatter};
use std::str::FromStr;

use async_trait::async_trait;
use ingest_core::{ActionInvoker, InvocationOutcome, InvocationPayload, render_chain};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::action::ActionName;
use crate::error::{InvocationError, InvokerError, InvokerResult};

/// Namespace placeholder resolved by the runtime to the caller's namespace.
pub const DEFAULT_NAMESPACE: &str = "_";

/// Runtime API key in `user:secret` form, sent as HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    user: String,
    secret: String,
}

impl ApiKey {
    /// Basic-auth user component.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Basic-auth password component.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl FromStr for ApiKey {
    type Err = InvokerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (user, secret) = value.split_once(':').ok_or(InvokerError::InvalidApiKey)?;
        let user = user.trim();
        if user.is_empty() || secret.trim().is_empty() {
            return Err(InvokerError::InvalidApiKey);
        }
        Ok(Self {
            user: user.to_string(),
            secret: secret.to_string(),
        })
    }
}

impl Debug for ApiKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ApiKey")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Invoker that submits activations without waiting for their results.
#[derive(Clone, Debug)]
pub struct OpenWhiskInvoker {
    client: Client,
    api_host: Url,
    api_key: ApiKey,
    namespace: Option<String>,
}

impl OpenWhiskInvoker {
    /// Build an invoker for `api_host`; a missing scheme defaults to `https`.
    ///
    /// # Errors
    ///
    /// Returns [`InvokerError::InvalidApiHost`] when the host cannot form a
    /// base URL.
    pub fn new(client: Client, api_host: &str, api_key: ApiKey) -> InvokerResult<Self> {
        Ok(Self {
            client,
            api_host: normalize_api_host(api_host)?,
            api_key,
            namespace: None,
        })
    }

    /// Resolve the default namespace `_` to `namespace` when addressing actions.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let namespace = namespace.trim();
        self.namespace = (!namespace.is_empty()).then(|| namespace.to_string());
        self
    }

    /// Base URL of the runtime API.
    #[must_use]
    pub const fn api_host(&self) -> &Url {
        &self.api_host
    }

    /// Non-blocking invocation URL for `action`.
    ///
    /// # Errors
    ///
    /// Returns [`InvokerError::InvalidApiHost`] when the configured host cannot
    /// carry a path.
    pub fn action_url(&self, action: &ActionName) -> InvokerResult<Url> {
        let namespace = if action.is_default_namespace() {
            self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
        } else {
            action.namespace()
        };

        let mut url = self.api_host.clone();
        {
            let mut segments =
                url.path_segments_mut()
                    .map_err(|()| InvokerError::InvalidApiHost {
                        value: self.api_host.to_string(),
                    })?;
            segments
                .pop_if_empty()
                .extend(["api", "v1", "namespaces", namespace, "actions"])
                .extend(action.path_segments());
        }
        url.query_pairs_mut().append_pair("blocking", "false");
        Ok(url)
    }

    async fn submit(
        &self,
        action: &str,
        payload: &InvocationPayload,
    ) -> Result<(String, Value), InvocationError> {
        let url = action
            .parse::<ActionName>()
            .and_then(|name| self.action_url(&name))
            .map_err(|source| InvocationError::Address {
                action: action.to_string(),
                source,
            })?;

        let response = self
            .client
            .post(url)
            .basic_auth(self.api_key.user(), Some(self.api_key.secret()))
            .json(payload)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    InvocationError::Timeout {
                        action: action.to_string(),
                    }
                } else {
                    InvocationError::Transport {
                        action: action.to_string(),
                        source,
                    }
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(InvocationError::NotFound {
                action: action.to_string(),
            });
        }
        if !status.is_success() {
            return Err(InvocationError::Rejected {
                action: action.to_string(),
                status: status.as_u16(),
                message: rejection_message(response).await,
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|source| InvocationError::MalformedBody {
                action: action.to_string(),
                source,
            })?;
        let activation_id = body
            .get("activationId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| InvocationError::MissingActivationId {
                action: action.to_string(),
            })?;
        Ok((activation_id, body))
    }
}

#[async_trait]
impl ActionInvoker for OpenWhiskInvoker {
    async fn invoke(&self, action: &str, payload: &InvocationPayload) -> InvocationOutcome {
        debug!(action, file_name = %payload.file_name, "invoking action");
        match self.submit(action, payload).await {
            Ok((id, response)) => {
                info!(
                    action,
                    file_name = %payload.file_name,
                    activation_id = %id,
                    "action invoked"
                );
                InvocationOutcome::Activation { id, response }
            }
            Err(err) => {
                let reason = render_chain(&err);
                warn!(
                    action,
                    file_name = %payload.file_name,
                    reason = %reason,
                    "action invocation failed"
                );
                InvocationOutcome::Failure { reason }
            }
        }
    }
}

#[derive(Deserialize)]
struct RuntimeErrorBody {
    error: String,
}

async fn rejection_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<RuntimeErrorBody>(&text)
        .map(|body| body.error)
        .ok()
        .or_else(|| Some(text.trim().to_string()).filter(|text| !text.is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

fn normalize_api_host(raw: &str) -> InvokerResult<Url> {
    let invalid = || InvokerError::InvalidApiHost {
        value: raw.to_string(),
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&candidate).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid());
    }
    Ok(url)
}
