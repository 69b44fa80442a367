//! Execution results in the standard GraphQL response shape.

use qlbridge_core::Location;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// A GraphQL response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl Response {
    /// Creates a successful response with data.
    #[must_use]
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(error: FieldError) -> Self {
        Self::errors(vec![error])
    }

    /// Creates an error response with multiple errors.
    #[must_use]
    pub fn errors(errors: Vec<FieldError>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Returns the errors, empty when there are none.
    #[must_use]
    pub fn error_list(&self) -> &[FieldError] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// Serializes the response to JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        if let Some(errors) = &self.errors {
            out.insert(
                "errors".to_string(),
                serde_json::to_value(errors).unwrap_or(Value::Null),
            );
        }
        if let Some(data) = &self.data {
            out.insert("data".to_string(), data.clone());
        }
        Value::Object(out)
    }
}

/// An error located in a response.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct FieldError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.get_or_insert_with(Vec::new).push(location);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Sets the `code` extension.
    #[must_use]
    pub fn with_code(self, code: impl Into<String>) -> Self {
        self.with_extension("code", Value::String(code.into()))
    }
}

/// A response path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_error_serializes_standard_shape() {
        let error = FieldError::new("boom")
            .with_location(Location { line: 2, column: 3 })
            .with_path(vec!["posts".into(), 0.into(), "title".into()])
            .with_code("INTERNAL");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "message": "boom",
                "locations": [{"line": 2, "column": 3}],
                "path": ["posts", 0, "title"],
                "extensions": {"code": "INTERNAL"}
            })
        );
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn test_response_helpers() {
        let ok = Response::data(json!({"a": 1}));
        assert!(!ok.has_errors());
        assert!(ok.error_list().is_empty());
        assert_eq!(ok.to_json(), json!({"data": {"a": 1}}));

        let failed = Response::error(FieldError::new("nope"));
        assert!(failed.has_errors());
        assert!(!failed.has_data());
        assert_eq!(failed.to_json(), json!({"errors": [{"message": "nope"}]}));
    }

    #[test]
    fn test_path_round_trip() {
        let path: Vec<PathSegment> = serde_json::from_value(json!(["a", 1])).unwrap();
        assert_eq!(path, [PathSegment::from("a"), PathSegment::Index(1)]);
    }
}
