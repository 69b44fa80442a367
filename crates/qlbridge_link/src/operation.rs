//! Operations as they arrive from the transport chain.

use qlbridge_syntax::{add_typename, parse_document, Document, SyntaxError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Transport-level context attached to an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
    /// Anything else earlier links put on the context.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperationContext {
    /// Reads a context key, including `headers` and `credentials`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match key {
            "headers" => self.headers.as_ref(),
            "credentials" => self.credentials.as_ref(),
            _ => self.extra.get(key),
        }
    }
}

/// One GraphQL operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub query: Document,
    pub variables: Map<String, Value>,
    pub operation_name: Option<String>,
    pub context: OperationContext,
}

impl Operation {
    /// Wraps a parsed query. The operation name defaults to the name of the
    /// first operation in the document.
    #[must_use]
    pub fn new(query: Document) -> Self {
        let operation_name = query
            .operations()
            .next()
            .and_then(|op| op.name.as_ref())
            .map(|name| name.value.clone());
        Self {
            query,
            variables: Map::new(),
            operation_name,
            context: OperationContext::default(),
        }
    }

    /// Parses query text into an operation.
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        Ok(Self::new(parse_document(source)?))
    }

    /// Adds `__typename` to every selection set, the way a normalized
    /// client cache rewrites queries before sending them.
    #[must_use]
    pub fn with_typename(mut self) -> Self {
        self.query = add_typename(&self.query);
        self
    }

    #[must_use]
    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: Value) -> Self {
        self.context.headers = Some(headers);
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: impl Into<Value>) -> Self {
        self.context.credentials = Some(credentials.into());
        self
    }

    #[must_use]
    pub fn context(mut self, context: OperationContext) -> Self {
        self.context = context;
        self
    }
}
