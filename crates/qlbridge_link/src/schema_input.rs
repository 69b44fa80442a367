//! The schema representations a link accepts.

use qlbridge_runtime::ExecutableSchema;
use qlbridge_syntax::Document;
use serde_json::Value;

/// A schema as handed to the link.
#[derive(Debug, Clone)]
pub enum SchemaInput {
    /// SDL text.
    Source(String),
    /// A parsed SDL document.
    Document(Document),
    /// A schema already bound to its resolvers.
    Executable(ExecutableSchema),
    /// Untyped input that matched none of the above. Rejected when the link
    /// is built.
    Unrecognized(Value),
}

impl SchemaInput {
    /// Short name of the variant, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Source(_) => "source",
            Self::Document(_) => "document",
            Self::Executable(_) => "executable",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

impl From<String> for SchemaInput {
    fn from(source: String) -> Self {
        Self::Source(source)
    }
}

impl From<&str> for SchemaInput {
    fn from(source: &str) -> Self {
        Self::Source(source.to_string())
    }
}

impl From<Document> for SchemaInput {
    fn from(document: Document) -> Self {
        Self::Document(document)
    }
}

impl From<ExecutableSchema> for SchemaInput {
    fn from(schema: ExecutableSchema) -> Self {
        Self::Executable(schema)
    }
}

/// Strings are SDL; objects tagged `"kind": "Document"` are serialized
/// documents.
impl From<Value> for SchemaInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(source) => Self::Source(source),
            Value::Object(ref object)
                if object.get("kind").and_then(Value::as_str) == Some(Document::KIND) =>
            {
                match serde_json::from_value::<Document>(value.clone()) {
                    Ok(document) => Self::Document(document),
                    Err(err) => {
                        tracing::debug!(error = %err, "schema object is not a valid document");
                        Self::Unrecognized(value)
                    }
                }
            }
            other => Self::Unrecognized(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlbridge_syntax::parse_document;
    use serde_json::json;

    #[test]
    fn test_json_strings_are_sources() {
        assert!(matches!(
            SchemaInput::from(json!("type Query { a: Int }")),
            SchemaInput::Source(s) if s == "type Query { a: Int }"
        ));
    }

    #[test]
    fn test_json_documents_round_trip() {
        let document = parse_document("type Query { a: Int }").unwrap();
        let value = serde_json::to_value(&document).unwrap();
        match SchemaInput::from(value) {
            SchemaInput::Document(parsed) => assert_eq!(parsed, document),
            other => panic!("expected a document, got {}", other.kind()),
        }
    }

    #[test]
    fn test_other_json_is_unrecognized() {
        for value in [
            json!({"nonValid": "schema"}),
            json!({"kind": "Document", "definitions": 3}),
            json!(42),
            json!(null),
        ] {
            assert_eq!(SchemaInput::from(value).kind(), "unrecognized");
        }
    }
}
