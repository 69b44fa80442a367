//! Error types for the bridge link.

use qlbridge_runtime::{FieldError, RequestError, SchemaError};
use serde_json::Value;
use thiserror::Error;

/// The link could not be built from its options.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("schema is required")]
    MissingSchema,

    #[error("schema must be plain text, a parsed document, or an executable schema")]
    UnrecognizedSchema,

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A contextware function failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ContextError {
    pub message: String,
}

impl ContextError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ContextError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ContextError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// An operation failed.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// The engine rejected the request before executing it.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The response carried field errors.
    #[error("{message}")]
    GraphQL {
        message: String,
        errors: Vec<FieldError>,
        data: Option<Value>,
    },

    #[error(transparent)]
    Context(#[from] ContextError),

    /// The stream's single result was already taken.
    #[error("result already consumed")]
    Consumed,
}

impl LinkError {
    /// Builds a [`LinkError::GraphQL`] from a response's errors.
    #[must_use]
    pub fn graphql(errors: Vec<FieldError>, data: Option<Value>) -> Self {
        let message = errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_default();
        Self::GraphQL {
            message,
            errors,
            data,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The GraphQL errors behind this failure. Contextware failures and
    /// consumed streams have none.
    #[must_use]
    pub fn graphql_errors(&self) -> Vec<FieldError> {
        match self {
            Self::Request(err) => err.errors(),
            Self::GraphQL { errors, .. } => errors.clone(),
            Self::Context(_) | Self::Consumed => Vec::new(),
        }
    }

    /// Partial data delivered alongside field errors.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::GraphQL { data, .. } => data.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graphql_error_uses_first_message() {
        let err = LinkError::graphql(
            vec![FieldError::new("bad request"), FieldError::new("also bad")],
            Some(json!({"posts": null})),
        );
        assert_eq!(err.message(), "bad request");
        assert_eq!(err.graphql_errors().len(), 2);
        assert_eq!(err.data(), Some(&json!({"posts": null})));
    }

    #[test]
    fn test_request_error_exposes_its_errors() {
        let err = LinkError::from(RequestError::NoOperation);
        assert_eq!(err.message(), "Must provide an operation.");
        assert_eq!(err.graphql_errors()[0].message, "Must provide an operation.");
        assert_eq!(err.data(), None);
    }

    #[test]
    fn test_context_error() {
        let err = LinkError::from(ContextError::from("no session"));
        assert_eq!(err.message(), "no session");
        assert!(err.graphql_errors().is_empty());
    }

    #[test]
    fn test_consumed_error() {
        let err = LinkError::Consumed;
        assert_eq!(err.message(), "result already consumed");
        assert!(err.graphql_errors().is_empty());
        assert_eq!(err.data(), None);
    }

    #[test]
    fn test_config_messages() {
        assert_eq!(ConfigError::MissingSchema.to_string(), "schema is required");
        assert_eq!(
            ConfigError::UnrecognizedSchema.to_string(),
            "schema must be plain text, a parsed document, or an executable schema"
        );
    }
}
