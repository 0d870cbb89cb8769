//! Parsing for OpenWhisk action identifiers.
//!
//! Accepted shapes: `/namespace/action`, `/namespace/package/action`,
//! `package/action`, and `action`. The relative forms use the default
//! namespace `_`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::InvokerError;
use crate::openwhisk::DEFAULT_NAMESPACE;

/// Fully qualified action reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionName {
    namespace: String,
    package: Option<String>,
    name: String,
}

impl ActionName {
    /// Namespace that owns the action (`_` for the caller's default).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Package containing the action, if any.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Bare action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the identifier defers to the caller's default namespace.
    #[must_use]
    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }

    /// Path below `actions/` in the REST API: `[package/]name`.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.package
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.name.as_str()))
    }
}

impl FromStr for ActionName {
    type Err = InvokerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| InvokerError::InvalidActionName {
            value: value.to_string(),
            reason,
        };

        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty"));
        }

        let (qualified, rest) = trimmed
            .strip_prefix('/')
            .map_or((false, trimmed), |rest| (true, rest));
        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(invalid("empty_segment"));
        }

        let (namespace, package, name) = match (qualified, segments.as_slice()) {
            (true, [namespace, name]) => (*namespace, None, *name),
            (true, [namespace, package, name]) => (*namespace, Some(*package), *name),
            (false, [name]) => (DEFAULT_NAMESPACE, None, *name),
            (false, [package, name]) => (DEFAULT_NAMESPACE, Some(*package), *name),
            _ => return Err(invalid("unexpected_segment_count")),
        };

        Ok(Self {
            namespace: namespace.to_string(),
            package: package.map(str::to_string),
            name: name.to_string(),
        })
    }
}

impl Display for ActionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "/{}", self.namespace)?;
        if let Some(package) = &self.package {
            write!(formatter, "/{package}")?;
        }
        write!(formatter, "/{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fully_qualified_package_action() -> Result<(), InvokerError> {
        let action: ActionName = "/_/openchecks/save-check-images".parse()?;
        assert_eq!(action.namespace(), "_");
        assert_eq!(action.package(), Some("openchecks"));
        assert_eq!(action.name(), "save-check-images");
        assert!(action.is_default_namespace());
        assert_eq!(
            action.path_segments().collect::<Vec<_>>(),
            vec!["openchecks", "save-check-images"]
        );
        Ok(())
    }

    #[test]
    fn parses_relative_and_namespaced_forms() -> Result<(), InvokerError> {
        let bare: ActionName = "hello".parse()?;
        assert_eq!(bare.to_string(), "/_/hello");

        let packaged: ActionName = "utils/echo".parse()?;
        assert_eq!(packaged.to_string(), "/_/utils/echo");

        let namespaced: ActionName = "/whisk.system/echo".parse()?;
        assert_eq!(namespaced.namespace(), "whisk.system");
        assert_eq!(namespaced.package(), None);
        assert!(!namespaced.is_default_namespace());
        Ok(())
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for value in ["", "  ", "/", "/only-namespace", "a//b", "/a/b/c/d", "a/b/c"] {
            assert!(
                matches!(
                    value.parse::<ActionName>(),
                    Err(InvokerError::InvalidActionName { .. })
                ),
                "{value:?} should be rejected"
            );
        }
    }
}
