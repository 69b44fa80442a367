//! Schemas bound to their resolvers.

use crate::resolver::ResolverMap;
use crate::schema::{Schema, SchemaError};
use qlbridge_syntax::{Document, TYPENAME_FIELD};

/// A schema plus the resolvers that run it.
#[derive(Debug, Clone)]
pub struct ExecutableSchema {
    schema: Schema,
    resolvers: ResolverMap,
}

impl ExecutableSchema {
    /// Binds `resolvers` to `schema`.
    ///
    /// Fails when a resolver targets a type or field the schema does not
    /// define, or a type resolver targets a type that is not abstract.
    pub fn new(schema: Schema, resolvers: ResolverMap) -> Result<Self, SchemaError> {
        for (type_name, field_name) in resolvers.fields() {
            let known = field_name == TYPENAME_FIELD || schema.field(type_name, field_name).is_some();
            if !known {
                return Err(SchemaError::UnknownResolver {
                    type_name: type_name.to_string(),
                    field_name: field_name.to_string(),
                });
            }
        }
        for type_name in resolvers.type_resolver_names() {
            if !schema.get_type(type_name).is_some_and(|ty| ty.is_abstract()) {
                return Err(SchemaError::InvalidTypeResolver {
                    type_name: type_name.to_string(),
                });
            }
        }
        Ok(Self { schema, resolvers })
    }

    /// Builds an executable schema from a parsed document.
    pub fn from_document(document: &Document, resolvers: ResolverMap) -> Result<Self, SchemaError> {
        Self::new(Schema::from_document(document)?, resolvers)
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn resolvers(&self) -> &ResolverMap {
        &self.resolvers
    }

    /// Mutable access to the resolvers, for decorating a built schema.
    pub fn resolvers_mut(&mut self) -> &mut ResolverMap {
        &mut self.resolvers
    }
}

/// Builds an executable schema from SDL text and a resolver map.
pub fn make_executable_schema(
    type_defs: &str,
    resolvers: ResolverMap,
) -> Result<ExecutableSchema, SchemaError> {
    let schema = Schema::parse(type_defs)?;
    ExecutableSchema::new(schema, resolvers)
}
