//! Error types for the locator engine

use thiserror::Error;
use uiquery_core_types::{ParseValueError, ProviderError};

/// Hard failures of the query engine.
///
/// "Not found" is never an error: searches return `Ok(None)` or an empty
/// vector for that. These variants signal contract violations, plus the
/// provider faults that surface outside a retry loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// Path string does not conform to the path grammar
    #[error("Invalid path expression '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Property name not present in the property registry
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// Literal value cannot be converted to the property's type
    #[error(transparent)]
    InvalidValue(#[from] ParseValueError),

    /// Multi-condition search called without any condition
    #[error("Empty condition set passed to {0}")]
    EmptyConditionSet(&'static str),

    /// Required argument missing or blank
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    /// Provider fault outside a retry loop
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl LocatorError {
    pub fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        LocatorError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = LocatorError::invalid_path("Pane[", "unbalanced bracket");
        assert_eq!(
            err.to_string(),
            "Invalid path expression 'Pane[': unbalanced bracket"
        );
        assert_eq!(
            LocatorError::from(ProviderError::transient("gone")).to_string(),
            "Provider error: provider call failed: gone"
        );
    }
}
