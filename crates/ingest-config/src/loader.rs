//! Parameter documents and the two-layer lookup.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::keys;

/// Invocation parameters as a flat JSON object.
pub type Parameters = Map<String, Value>;

/// Layer a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSource {
    /// Invocation parameter document.
    Params,
    /// Process environment.
    Environment,
}

impl ParameterSource {
    /// Stable lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::Environment => "environment",
        }
    }
}

/// Parse an inline parameter document. Blank input is an empty document.
///
/// # Errors
///
/// Returns [`ConfigError::ParseParams`] for invalid JSON and
/// [`ConfigError::ParamsNotObject`] when the document is not an object.
pub fn parse_params(text: &str) -> ConfigResult<Parameters> {
    if text.trim().is_empty() {
        return Ok(Parameters::new());
    }
    let document: Value =
        serde_json::from_str(text).map_err(|source| ConfigError::ParseParams { source })?;
    match document {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::ParamsNotObject),
    }
}

/// Read and parse a parameter document from disk.
///
/// # Errors
///
/// Returns [`ConfigError::ReadParams`] when the file cannot be read, plus the
/// errors of [`parse_params`].
pub fn read_params_file(path: &Path) -> ConfigResult<Parameters> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadParams {
        path: path.to_path_buf(),
        source,
    })?;
    parse_params(&text)
}

/// Parameters first, environment second; blank values count as absent.
///
/// Values are trimmed except for secrets, which pass through unchanged.
pub(crate) struct Lookup<'a, F> {
    params: &'a Parameters,
    env: F,
}

impl<'a, F> Lookup<'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    pub(crate) const fn new(params: &'a Parameters, env: F) -> Self {
        Self { params, env }
    }

    pub(crate) fn get(&self, name: &'static str) -> ConfigResult<Option<String>> {
        let resolved = match self.params.get(name) {
            Some(value) => scalar(name, value)?.map(|value| (value, ParameterSource::Params)),
            None => None,
        };
        let resolved = resolved.or_else(|| {
            (self.env)(name)
                .and_then(|value| normalize(name, value))
                .map(|value| (value, ParameterSource::Environment))
        });

        Ok(resolved.map(|(value, source)| {
            if keys::SECRET.contains(&name) {
                debug!(parameter = name, source = source.as_str(), "parameter resolved");
            } else {
                debug!(
                    parameter = name,
                    source = source.as_str(),
                    value = %value,
                    "parameter resolved"
                );
            }
            value
        }))
    }
}

fn scalar(name: &'static str, value: &Value) -> ConfigResult<Option<String>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(_) | Value::Object(_) => {
            return Err(ConfigError::invalid(name, "must_be_scalar", None));
        }
    };
    Ok(normalize(name, text))
}

fn normalize(name: &'static str, value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if keys::SECRET.contains(&name) {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}
