//! Validated run configuration.

use std::time::Duration;

use ingest_core::{Credentials, Region};
use ingest_invoker::{ActionName, ApiKey, InvokerError};
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::keys;
use crate::loader::{Lookup, Parameters};

/// Settings for reaching the action runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Runtime API host, scheme optional.
    pub api_host: String,
    /// Basic-auth key for the runtime API.
    pub api_key: ApiKey,
    /// Namespace substituted for `_`, when the runtime reports one.
    pub namespace: Option<String>,
}

/// Everything a run needs, validated before any network call.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Storage credentials.
    pub credentials: Credentials,
    /// Parsed storage region.
    pub region: Region,
    /// Container listed on every run.
    pub container: String,
    /// Action invoked once per file.
    pub save_action: ActionName,
    /// Identity endpoint override; `None` uses the adapter default.
    pub identity_url: Option<Url>,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Action runtime settings.
    pub runtime: RuntimeSettings,
}

impl IngestConfig {
    /// Resolve configuration from `params`, falling back to `env` per name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFields`] naming every absent required
    /// parameter, or [`ConfigError::InvalidField`] for the first unusable one.
    pub fn resolve<F>(params: &Parameters, env: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = Lookup::new(params, env);
        let mut required = RequiredFields::new(&lookup);
        let region = required.take(keys::REGION)?;
        let project_id = required.take(keys::PROJECT_ID)?;
        let user_id = required.take(keys::USER_ID)?;
        let password = required.take(keys::PASSWORD)?;
        let container = required.take(keys::INCOMING_CONTAINER)?;
        let api_host = required.take(keys::RUNTIME_API_HOST)?;
        let api_key = required.take(keys::RUNTIME_API_KEY)?;
        required.finish()?;

        let parsed_region = parse_region(&region)?;
        parsed_region.base_url(&project_id).map_err(|_| {
            ConfigError::invalid(keys::PROJECT_ID, "invalid_project_id", Some(project_id.clone()))
        })?;
        if container.contains(['/', '?', '#']) {
            return Err(ConfigError::invalid(
                keys::INCOMING_CONTAINER,
                "invalid_container_name",
                Some(container),
            ));
        }

        let save_action = parse_action(
            lookup
                .get(keys::SAVE_ACTION_NAME)?
                .unwrap_or_else(|| keys::DEFAULT_SAVE_ACTION.to_string()),
        )?;
        let identity_url = lookup
            .get(keys::AUTH_URL)?
            .map(|value| parse_http_url(keys::AUTH_URL, value))
            .transpose()?;
        let http_timeout = lookup
            .get(keys::HTTP_TIMEOUT_SECS)?
            .map_or(Ok(keys::DEFAULT_HTTP_TIMEOUT_SECS), parse_timeout)
            .map(Duration::from_secs)?;
        let api_key = api_key.parse::<ApiKey>().map_err(|_| {
            ConfigError::invalid(keys::RUNTIME_API_KEY, "expected_user_colon_secret", None)
        })?;

        Ok(Self {
            credentials: Credentials::new(region, project_id, user_id, password),
            region: parsed_region,
            container,
            save_action,
            identity_url,
            http_timeout,
            runtime: RuntimeSettings {
                api_host,
                api_key,
                namespace: lookup.get(keys::RUNTIME_NAMESPACE)?,
            },
        })
    }

    /// Resolve configuration against the process environment.
    ///
    /// # Errors
    ///
    /// See [`IngestConfig::resolve`].
    pub fn from_process_env(params: &Parameters) -> ConfigResult<Self> {
        Self::resolve(params, |name| std::env::var(name).ok())
    }
}

struct RequiredFields<'l, 'a, F> {
    lookup: &'l Lookup<'a, F>,
    missing: Vec<&'static str>,
}

impl<'l, 'a, F> RequiredFields<'l, 'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    const fn new(lookup: &'l Lookup<'a, F>) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    fn take(&mut self, name: &'static str) -> ConfigResult<String> {
        Ok(self.lookup.get(name)?.unwrap_or_else(|| {
            self.missing.push(name);
            String::new()
        }))
    }

    fn finish(self) -> ConfigResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFields {
                fields: self.missing,
            })
        }
    }
}

fn parse_region(value: &str) -> ConfigResult<Region> {
    value.parse::<Region>().map_err(|_| {
        ConfigError::invalid(keys::REGION, "unsupported_region", Some(value.to_string()))
    })
}

fn parse_action(value: String) -> ConfigResult<ActionName> {
    value.parse::<ActionName>().map_err(|err| {
        let reason = match err {
            InvokerError::InvalidActionName { reason, .. } => reason,
            _ => "invalid_action_name",
        };
        ConfigError::invalid(keys::SAVE_ACTION_NAME, reason, Some(value))
    })
}

fn parse_http_url(field: &'static str, value: String) -> ConfigResult<Url> {
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(ConfigError::invalid(field, "invalid_url", Some(value))),
    }
}

fn parse_timeout(value: String) -> ConfigResult<u64> {
    value
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| {
            ConfigError::invalid(keys::HTTP_TIMEOUT_SECS, "must_be_positive_integer", Some(value))
        })
}
