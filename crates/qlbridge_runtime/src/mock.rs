//! Mock data for schemas without (complete) resolvers.
//!
//! [`add_mocks_to_schema`] installs a resolver on every object field that
//! reads the field from its parent when present and otherwise generates a
//! placeholder value from the field's type.

use crate::context::Context;
use crate::executable::ExecutableSchema;
use crate::resolver::{Resolver, ResolverArgs, ResolverFuture, ResolverInfo, SharedResolver};
use crate::schema::{Schema, TypeDef, TypeRef};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Number of items generated for list fields.
const MOCK_LIST_LENGTH: usize = 2;

/// A generator for one named type.
pub type MockFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Mocking options.
#[derive(Clone)]
pub struct MockOptions {
    /// Keep resolvers already registered on the schema.
    pub preserve_resolvers: bool,
    /// Generators by type name. These win over the built-in scalar mocks.
    pub mocks: IndexMap<String, MockFn>,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            preserve_resolvers: true,
            mocks: IndexMap::new(),
        }
    }
}

impl fmt::Debug for MockOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockOptions")
            .field("preserve_resolvers", &self.preserve_resolvers)
            .field("mocks", &self.mocks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MockOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn preserve_resolvers(mut self, preserve: bool) -> Self {
        self.preserve_resolvers = preserve;
        self
    }

    /// Adds a generator for `type_name`.
    #[must_use]
    pub fn mock<F>(mut self, type_name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.mocks.insert(type_name.into(), Arc::new(f));
        self
    }
}

/// Installs mock resolvers on every object field of `schema`.
///
/// With `preserve_resolvers`, fields that already have a resolver keep it;
/// their results still flow into mocked child fields.
pub fn add_mocks_to_schema(schema: &mut ExecutableSchema, options: MockOptions) {
    let generator = Arc::new(MockGenerator {
        schema: schema.schema().clone(),
        mocks: options.mocks,
        ids: AtomicUsize::new(0),
    });

    let targets: Vec<(String, String)> = schema
        .schema()
        .types
        .values()
        .filter_map(|ty| match ty {
            TypeDef::Object(object) => Some(object),
            _ => None,
        })
        .flat_map(|object| {
            object
                .fields
                .keys()
                .map(move |field| (object.name.clone(), field.clone()))
        })
        .filter(|(type_name, field)| {
            !options.preserve_resolvers || !schema.resolvers().is_explicit(type_name, field)
        })
        .collect();

    tracing::debug!(
        fields = targets.len(),
        preserve = options.preserve_resolvers,
        "installing mock resolvers"
    );
    let resolver: SharedResolver = Arc::new(MockResolver { generator });
    let resolvers = schema.resolvers_mut();
    for (type_name, field) in targets {
        resolvers.register_shared(type_name, field, Arc::clone(&resolver));
    }
}

struct MockGenerator {
    schema: Schema,
    mocks: IndexMap<String, MockFn>,
    ids: AtomicUsize,
}

impl MockGenerator {
    fn generate(&self, ty: &TypeRef) -> Value {
        match ty {
            TypeRef::NonNull(inner) => self.generate(inner),
            TypeRef::List(inner) => {
                Value::Array((0..MOCK_LIST_LENGTH).map(|_| self.generate(inner)).collect())
            }
            TypeRef::Named(name) => self.generate_named(name),
        }
    }

    fn generate_named(&self, name: &str) -> Value {
        if let Some(mock) = self.mocks.get(name) {
            return mock();
        }
        match name {
            "Int" => json!(42),
            "Float" => json!(4.2),
            "String" => json!("Hello World"),
            "Boolean" => json!(true),
            "ID" => json!(format!("mock-{}", self.ids.fetch_add(1, Ordering::Relaxed) + 1)),
            _ => match self.schema.get_type(name) {
                Some(TypeDef::Enum(def)) => def
                    .values
                    .first()
                    .map_or(Value::Null, |v| Value::String(v.name.clone())),
                Some(TypeDef::Object(_)) => Value::Object(Map::new()),
                Some(def) if def.is_abstract() => self
                    .schema
                    .possible_types(name)
                    .first()
                    .map_or(Value::Null, |object| json!({ "__typename": object })),
                _ => json!("Hello World"),
            },
        }
    }
}

struct MockResolver {
    generator: Arc<MockGenerator>,
}

impl Resolver for MockResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        _args: &'a ResolverArgs,
        _ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        Box::pin(async move {
            if let Some(value) = parent.as_object().and_then(|p| p.get(&info.field_name)) {
                return Ok(value.clone());
            }
            let ty = self
                .generator
                .schema
                .field(&info.parent_type, &info.field_name)
                .map(|def| &def.ty);
            Ok(ty.map_or(Value::Null, |ty| self.generator.generate(ty)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executable::make_executable_schema;
    use crate::executor::graphql;
    use crate::resolver::ResolverMap;

    const SDL: &str = r#"
        enum Role { ADMIN USER }
        scalar Date
        type User { id: ID!, name: String, age: Int, score: Float, active: Boolean, role: Role, joined: Date }
        type Query { me: User, users: [User!]!, greeting: String }
    "#;

    async fn run(schema: &ExecutableSchema, query: &str) -> Value {
        let response = graphql(schema, query, None, Context::new(), None, None)
            .await
            .unwrap();
        assert_eq!(response.errors, None);
        response.data.unwrap()
    }

    #[tokio::test]
    async fn test_mocks_every_scalar_kind() {
        let mut schema = make_executable_schema(SDL, ResolverMap::new()).unwrap();
        add_mocks_to_schema(&mut schema, MockOptions::new());
        let data = run(
            &schema,
            "{ me { id name age score active role joined } greeting }",
        )
        .await;
        assert_eq!(
            data,
            json!({
                "me": {
                    "id": "mock-1",
                    "name": "Hello World",
                    "age": 42,
                    "score": 4.2,
                    "active": true,
                    "role": "ADMIN",
                    "joined": "Hello World"
                },
                "greeting": "Hello World"
            })
        );
    }

    #[tokio::test]
    async fn test_lists_have_two_items() {
        let mut schema = make_executable_schema(SDL, ResolverMap::new()).unwrap();
        add_mocks_to_schema(&mut schema, MockOptions::new());
        let data = run(&schema, "{ users { name } }").await;
        assert_eq!(
            data,
            json!({"users": [{"name": "Hello World"}, {"name": "Hello World"}]})
        );
    }

    #[tokio::test]
    async fn test_preserved_resolvers_feed_mocked_children() {
        let resolvers = ResolverMap::new()
            .with_fn("Query", "me", |_, _, _, _| Ok(json!({"name": "Ada"})))
            .with_fn("Query", "greeting", |_, _, _, _| Ok(json!("hi")));
        let mut schema = make_executable_schema(SDL, resolvers).unwrap();
        add_mocks_to_schema(&mut schema, MockOptions::new());
        let data = run(&schema, "{ greeting me { name age } }").await;
        assert_eq!(
            data,
            json!({"greeting": "hi", "me": {"name": "Ada", "age": 42}})
        );
    }

    #[tokio::test]
    async fn test_replacing_resolvers_and_custom_mocks() {
        let resolvers = ResolverMap::new().with_fn("Query", "greeting", |_, _, _, _| Ok(json!("hi")));
        let mut schema = make_executable_schema(SDL, resolvers).unwrap();
        add_mocks_to_schema(
            &mut schema,
            MockOptions::new()
                .preserve_resolvers(false)
                .mock("String", || json!("mocked"))
                .mock("Date", || json!("2024-01-01")),
        );
        let data = run(&schema, "{ greeting me { joined } }").await;
        assert_eq!(
            data,
            json!({"greeting": "mocked", "me": {"joined": "2024-01-01"}})
        );
    }

    #[test]
    fn test_options_debug_lists_mocked_types() {
        let options = MockOptions::new().mock("Date", || json!(null));
        assert_eq!(
            format!("{options:?}"),
            "MockOptions { preserve_resolvers: true, mocks: [\"Date\"] }"
        );
    }
}
