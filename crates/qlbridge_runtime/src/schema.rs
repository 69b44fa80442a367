//! Schema model built from type system definitions.
//!
//! [`Schema::from_document`] folds a parsed document (definitions and
//! `extend` blocks) into a checked [`Schema`]. Every problem found is
//! collected before failing so callers see all of them at once.

use crate::values::const_value;
use indexmap::IndexMap;
use qlbridge_core::diagnostics::codes;
use qlbridge_core::{Diagnostic, DiagnosticBag, Span};
use qlbridge_syntax::{self as ast, Definition, DirectiveLocation, Document, OperationType};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Names of the scalars every schema has.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Error building a schema.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// The type definitions did not parse.
    #[error(transparent)]
    Syntax(#[from] ast::SyntaxError),

    /// The type definitions parsed but do not form a valid schema.
    #[error("Invalid schema: {diagnostics}")]
    Invalid { diagnostics: DiagnosticBag },

    /// A resolver is registered for a field the schema does not define.
    #[error("{type_name}.{field_name} defined in resolvers, but not in schema")]
    UnknownResolver {
        type_name: String,
        field_name: String,
    },

    /// A type resolver is registered for a type that is not abstract.
    #[error("{type_name}.__resolveType defined in resolvers, but {type_name} is not an interface or union")]
    InvalidTypeResolver { type_name: String },
}

impl SchemaError {
    /// Returns the diagnostics behind a syntax or validity failure.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&DiagnosticBag> {
        match self {
            Self::Syntax(err) => Some(&err.diagnostics),
            Self::Invalid { diagnostics } => Some(diagnostics),
            Self::UnknownResolver { .. } | Self::InvalidTypeResolver { .. } => None,
        }
    }
}

/// A GraphQL schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub types: IndexMap<String, TypeDef>,
    pub directives: IndexMap<String, DirectiveDef>,
}

impl Schema {
    /// Parses and builds a schema from SDL text.
    pub fn parse(type_defs: &str) -> Result<Self, SchemaError> {
        let document = ast::parse_document(type_defs)?;
        Self::from_document(&document)
    }

    /// Builds a schema from a parsed document.
    pub fn from_document(document: &Document) -> Result<Self, SchemaError> {
        let schema = SchemaBuilder::new().build(document)?;
        tracing::debug!(
            types = schema.types.len(),
            query = %schema.query_type,
            mutation = ?schema.mutation_type,
            "built schema"
        );
        Ok(schema)
    }

    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectDef> {
        match self.types.get(name) {
            Some(TypeDef::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Looks up a field of an object or interface type.
    #[must_use]
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.types.get(type_name)?.fields()?.get(field_name)
    }

    /// Returns the root type name of an operation kind.
    #[must_use]
    pub fn root_type(&self, operation: OperationType) -> Option<&str> {
        match operation {
            OperationType::Query => Some(&self.query_type),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }
    }

    /// Returns the object types a value of `type_name` can be, in
    /// declaration order. An object type is its own only possible type.
    #[must_use]
    pub fn possible_types(&self, type_name: &str) -> Vec<&str> {
        match self.types.get(type_name) {
            Some(TypeDef::Object(object)) => vec![object.name.as_str()],
            Some(TypeDef::Union(union)) => union.members.iter().map(String::as_str).collect(),
            Some(TypeDef::Interface(_)) => self
                .types
                .values()
                .filter_map(|ty| match ty {
                    TypeDef::Object(object)
                        if object.implements.iter().any(|i| i == type_name) =>
                    {
                        Some(object.name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true if `object_type` is a possible type of `type_name`.
    #[must_use]
    pub fn is_possible_type(&self, type_name: &str, object_type: &str) -> bool {
        self.possible_types(type_name).contains(&object_type)
    }
}

/// A named type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDef {
    Scalar(ScalarDef),
    Object(ObjectDef),
    Interface(InterfaceDef),
    Union(UnionDef),
    Enum(EnumDef),
    InputObject(InputObjectDef),
}

impl TypeDef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(s) => &s.name,
            Self::Object(o) => &o.name,
            Self::Interface(i) => &i.name,
            Self::Union(u) => &u.name,
            Self::Enum(e) => &e.name,
            Self::InputObject(i) => &i.name,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Object(_) => "object",
            Self::Interface(_) => "interface",
            Self::Union(_) => "union",
            Self::Enum(_) => "enum",
            Self::InputObject(_) => "input object",
        }
    }

    /// Returns the fields of an object or interface type.
    #[must_use]
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDef>> {
        match self {
            Self::Object(o) => Some(&o.fields),
            Self::Interface(i) => Some(&i.fields),
            _ => None,
        }
    }

    /// Scalars and enums.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Interfaces and unions.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    /// Types that may appear as a field result.
    #[must_use]
    pub const fn is_output(&self) -> bool {
        !matches!(self, Self::InputObject(_))
    }

    /// Types that may appear as an argument or variable.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }
}

/// Scalar type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarDef {
    pub name: String,
    pub description: Option<String>,
}

/// Object type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
}

/// Interface type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
}

/// Union type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionDef {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

/// Enum type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDef>,
}

impl EnumDef {
    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name == name)
    }
}

/// Enum value definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub deprecated: bool,
    pub deprecation_reason: Option<String>,
}

/// Input object type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueDef>,
}

/// Field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputValueDef>,
    pub deprecated: bool,
    pub deprecation_reason: Option<String>,
}

/// Argument or input field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<serde_json::Value>,
}

/// Type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    #[must_use]
    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    #[must_use]
    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Converts a syntax-level type.
    #[must_use]
    pub fn from_ast(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Named(named) => Self::Named(named.name.clone()),
            ast::Type::List(inner, _) => Self::list(Self::from_ast(inner)),
            ast::Type::NonNull(inner, _) => Self::non_null(Self::from_ast(inner)),
        }
    }

    /// Returns the innermost named type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.name(),
        }
    }

    #[must_use]
    pub const fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Strips one level of non-null.
    #[must_use]
    pub fn nullable(&self) -> &Self {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// Directive definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveDef {
    pub name: String,
    pub description: Option<String>,
    pub arguments: IndexMap<String, InputValueDef>,
    pub locations: Vec<DirectiveLocation>,
    pub repeatable: bool,
}

/// Folds definitions into a [`Schema`], collecting diagnostics.
struct SchemaBuilder {
    types: IndexMap<String, TypeDef>,
    spans: IndexMap<String, Span>,
    directives: IndexMap<String, DirectiveDef>,
    roots: IndexMap<OperationType, (String, Span)>,
    has_schema_definition: bool,
    diagnostics: DiagnosticBag,
}

impl SchemaBuilder {
    fn new() -> Self {
        let mut builder = Self {
            types: IndexMap::new(),
            spans: IndexMap::new(),
            directives: IndexMap::new(),
            roots: IndexMap::new(),
            has_schema_definition: false,
            diagnostics: DiagnosticBag::new(),
        };
        for name in BUILTIN_SCALARS {
            builder.types.insert(
                name.to_string(),
                TypeDef::Scalar(ScalarDef {
                    name: name.to_string(),
                    description: None,
                }),
            );
        }
        builder.add_builtin_directives();
        builder
    }

    fn add_builtin_directives(&mut self) {
        let arg = |name: &str, ty: TypeRef, default: Option<serde_json::Value>| {
            (
                name.to_string(),
                InputValueDef {
                    name: name.to_string(),
                    description: None,
                    ty,
                    default_value: default,
                },
            )
        };
        let boolean = || TypeRef::non_null(TypeRef::named("Boolean"));
        let string = || TypeRef::named("String");
        let builtins = [
            (
                "skip",
                vec![arg("if", boolean(), None)],
                vec![
                    DirectiveLocation::Field,
                    DirectiveLocation::FragmentSpread,
                    DirectiveLocation::InlineFragment,
                ],
            ),
            (
                "include",
                vec![arg("if", boolean(), None)],
                vec![
                    DirectiveLocation::Field,
                    DirectiveLocation::FragmentSpread,
                    DirectiveLocation::InlineFragment,
                ],
            ),
            (
                "deprecated",
                vec![arg(
                    "reason",
                    string(),
                    Some(serde_json::Value::from("No longer supported")),
                )],
                vec![
                    DirectiveLocation::FieldDefinition,
                    DirectiveLocation::ArgumentDefinition,
                    DirectiveLocation::InputFieldDefinition,
                    DirectiveLocation::EnumValue,
                ],
            ),
            (
                "specifiedBy",
                vec![arg("url", TypeRef::non_null(string()), None)],
                vec![DirectiveLocation::Scalar],
            ),
        ];
        for (name, arguments, locations) in builtins {
            self.directives.insert(
                name.to_string(),
                DirectiveDef {
                    name: name.to_string(),
                    description: None,
                    arguments: arguments.into_iter().collect(),
                    locations,
                    repeatable: false,
                },
            );
        }
    }

    fn error(&mut self, code: &'static str, title: &str, span: Span, message: String) {
        self.diagnostics.add(Diagnostic::error(code, title).with_span(span, message));
    }

    fn build(mut self, document: &Document) -> Result<Schema, SchemaError> {
        let mut extensions = Vec::new();
        for def in &document.definitions {
            match def {
                Definition::Schema(schema) => {
                    if self.has_schema_definition {
                        self.error(
                            codes::INVALID_ROOT,
                            "duplicate schema definition",
                            schema.span,
                            "Must provide only one schema definition.".to_string(),
                        );
                    }
                    self.has_schema_definition = true;
                    self.add_root_operations(&schema.operations);
                }
                Definition::SchemaExtension(_) => extensions.push(def),
                Definition::Type(ty) => self.add_type(ty),
                Definition::TypeExtension(_) => extensions.push(def),
                Definition::Directive(directive) => self.add_directive(directive),
                Definition::Operation(_) | Definition::Fragment(_) => {
                    let kind = if matches!(def, Definition::Operation(_)) {
                        "operation"
                    } else {
                        "fragment"
                    };
                    self.error(
                        codes::NOT_TYPE_SYSTEM,
                        "executable definition in schema",
                        def.span(),
                        format!("The {kind} definition is not a type system definition."),
                    );
                }
            }
        }
        for def in extensions {
            match def {
                Definition::SchemaExtension(schema) => self.add_root_operations(&schema.operations),
                Definition::TypeExtension(ty) => self.extend_type(ty),
                _ => {}
            }
        }

        self.check_references();
        let (query_type, mutation_type, subscription_type) = self.resolve_roots();

        if self.diagnostics.has_errors() {
            return Err(SchemaError::Invalid {
                diagnostics: self.diagnostics,
            });
        }
        Ok(Schema {
            query_type: query_type.unwrap_or_default(),
            mutation_type,
            subscription_type,
            types: self.types,
            directives: self.directives,
        })
    }

    fn add_root_operations(&mut self, operations: &[ast::OperationTypeDefinition]) {
        for op in operations {
            if self.roots.contains_key(&op.operation) {
                self.error(
                    codes::INVALID_ROOT,
                    "duplicate root operation",
                    op.span,
                    format!("Type for {} already defined in the schema.", op.operation.as_str()),
                );
                continue;
            }
            self.roots
                .insert(op.operation, (op.type_name.value.clone(), op.type_name.span));
        }
    }

    fn add_type(&mut self, def: &ast::TypeDefinition) {
        let name = def.name().value.clone();
        if let Some(existing) = self.types.get(&name) {
            // Restating a built-in scalar is harmless.
            let restates_builtin = BUILTIN_SCALARS.contains(&name.as_str())
                && matches!(def, ast::TypeDefinition::Scalar(_))
                && matches!(existing, TypeDef::Scalar(_));
            if !restates_builtin {
                self.error(
                    codes::DUPLICATE_TYPE,
                    "duplicate type",
                    def.name().span,
                    format!("There can be only one type named \"{name}\"."),
                );
            }
            return;
        }
        let ty = self.convert_type(def);
        self.spans.insert(name.clone(), def.name().span);
        self.types.insert(name, ty);
    }

    fn convert_type(&mut self, def: &ast::TypeDefinition) -> TypeDef {
        let description = |d: &Option<ast::Description>| d.as_ref().map(|d| d.value.clone());
        match def {
            ast::TypeDefinition::Scalar(s) => TypeDef::Scalar(ScalarDef {
                name: s.name.value.clone(),
                description: description(&s.description),
            }),
            ast::TypeDefinition::Object(o) => TypeDef::Object(ObjectDef {
                name: o.name.value.clone(),
                description: description(&o.description),
                fields: self.convert_fields(&o.name.value, &o.fields, IndexMap::new()),
                implements: o.implements.iter().map(|n| n.value.clone()).collect(),
            }),
            ast::TypeDefinition::Interface(i) => TypeDef::Interface(InterfaceDef {
                name: i.name.value.clone(),
                description: description(&i.description),
                fields: self.convert_fields(&i.name.value, &i.fields, IndexMap::new()),
                implements: i.implements.iter().map(|n| n.value.clone()).collect(),
            }),
            ast::TypeDefinition::Union(u) => TypeDef::Union(UnionDef {
                name: u.name.value.clone(),
                description: description(&u.description),
                members: u.members.iter().map(|n| n.value.clone()).collect(),
            }),
            ast::TypeDefinition::Enum(e) => TypeDef::Enum(EnumDef {
                name: e.name.value.clone(),
                description: description(&e.description),
                values: e.values.iter().map(convert_enum_value).collect(),
            }),
            ast::TypeDefinition::InputObject(i) => TypeDef::InputObject(InputObjectDef {
                name: i.name.value.clone(),
                description: description(&i.description),
                fields: self.convert_input_values(&i.name.value, &i.fields, IndexMap::new()),
            }),
        }
    }

    fn convert_fields(
        &mut self,
        type_name: &str,
        fields: &[ast::FieldDefinition],
        mut into: IndexMap<String, FieldDef>,
    ) -> IndexMap<String, FieldDef> {
        for field in fields {
            let name = field.name.value.clone();
            if into.contains_key(&name) {
                self.error(
                    codes::DUPLICATE_FIELD,
                    "duplicate field",
                    field.name.span,
                    format!("Field \"{type_name}.{name}\" can only be defined once."),
                );
                continue;
            }
            let (deprecated, deprecation_reason) = deprecation(&field.directives);
            let arguments = self.convert_input_values(
                &format!("{type_name}.{name}"),
                &field.arguments,
                IndexMap::new(),
            );
            into.insert(
                name.clone(),
                FieldDef {
                    name,
                    description: field.description.as_ref().map(|d| d.value.clone()),
                    ty: TypeRef::from_ast(&field.ty),
                    arguments,
                    deprecated,
                    deprecation_reason,
                },
            );
        }
        into
    }

    fn convert_input_values(
        &mut self,
        owner: &str,
        values: &[ast::InputValueDefinition],
        mut into: IndexMap<String, InputValueDef>,
    ) -> IndexMap<String, InputValueDef> {
        for value in values {
            let name = value.name.value.clone();
            if into.contains_key(&name) {
                self.error(
                    codes::DUPLICATE_FIELD,
                    "duplicate input value",
                    value.name.span,
                    format!("Input value \"{owner}.{name}\" can only be defined once."),
                );
                continue;
            }
            into.insert(
                name.clone(),
                InputValueDef {
                    name,
                    description: value.description.as_ref().map(|d| d.value.clone()),
                    ty: TypeRef::from_ast(&value.ty),
                    default_value: value.default_value.as_ref().map(const_value),
                },
            );
        }
        into
    }

    fn add_directive(&mut self, def: &ast::DirectiveDefinition) {
        let name = def.name.value.clone();
        if self.directives.contains_key(&name) {
            self.error(
                codes::DUPLICATE_TYPE,
                "duplicate directive",
                def.name.span,
                format!("There can be only one directive named \"@{name}\"."),
            );
            return;
        }
        let arguments = self.convert_input_values(&format!("@{name}"), &def.arguments, IndexMap::new());
        self.directives.insert(
            name.clone(),
            DirectiveDef {
                name,
                description: def.description.as_ref().map(|d| d.value.clone()),
                arguments,
                locations: def.locations.clone(),
                repeatable: def.repeatable,
            },
        );
    }

    fn extend_type(&mut self, ext: &ast::TypeDefinition) {
        let name = ext.name().value.clone();
        // Swap the target out so the field conversion can borrow `self`.
        let placeholder = TypeDef::Scalar(ScalarDef {
            name: name.clone(),
            description: None,
        });
        let Some(mut target) = self
            .types
            .get_mut(&name)
            .map(|slot| std::mem::replace(slot, placeholder))
        else {
            self.error(
                codes::INVALID_EXTENSION,
                "unknown extension target",
                ext.name().span,
                format!("Cannot extend type \"{name}\" because it is not defined."),
            );
            return;
        };
        match (&mut target, ext) {
            (TypeDef::Scalar(_), ast::TypeDefinition::Scalar(_)) => {}
            (TypeDef::Object(o), ast::TypeDefinition::Object(e)) => {
                o.fields = self.convert_fields(&name, &e.fields, std::mem::take(&mut o.fields));
                o.implements.extend(e.implements.iter().map(|n| n.value.clone()));
            }
            (TypeDef::Interface(i), ast::TypeDefinition::Interface(e)) => {
                i.fields = self.convert_fields(&name, &e.fields, std::mem::take(&mut i.fields));
                i.implements.extend(e.implements.iter().map(|n| n.value.clone()));
            }
            (TypeDef::Union(u), ast::TypeDefinition::Union(e)) => {
                u.members.extend(e.members.iter().map(|n| n.value.clone()));
            }
            (TypeDef::Enum(en), ast::TypeDefinition::Enum(e)) => {
                en.values.extend(e.values.iter().map(convert_enum_value));
            }
            (TypeDef::InputObject(i), ast::TypeDefinition::InputObject(e)) => {
                i.fields = self.convert_input_values(&name, &e.fields, std::mem::take(&mut i.fields));
            }
            (existing, _) => {
                let kind = existing.kind();
                self.error(
                    codes::INVALID_EXTENSION,
                    "extension kind mismatch",
                    ext.name().span,
                    format!(
                        "Cannot extend non-{} type \"{name}\".",
                        ext.keyword()
                    ),
                );
                tracing::trace!(%name, kind, "extension does not match type kind");
            }
        }
        if let Some(slot) = self.types.get_mut(&name) {
            *slot = target;
        }
    }

    fn check_references(&mut self) {
        let mut problems = Vec::new();
        for ty in self.types.values() {
            let span = self.spans.get(ty.name()).copied().unwrap_or_default();
            match ty {
                TypeDef::Object(ObjectDef {
                    name,
                    fields,
                    implements,
                    ..
                })
                | TypeDef::Interface(InterfaceDef {
                    name,
                    fields,
                    implements,
                    ..
                }) => {
                    for iface in implements {
                        match self.types.get(iface) {
                            None => problems.push(unknown_type(iface, span)),
                            Some(TypeDef::Interface(_)) => {}
                            Some(_) => problems.push((
                                codes::INVALID_TYPE_KIND,
                                span,
                                format!("Type \"{name}\" must only implement Interface types, it cannot implement \"{iface}\"."),
                            )),
                        }
                    }
                    for field in fields.values() {
                        let target = field.ty.name();
                        match self.types.get(target) {
                            None => problems.push(unknown_type(target, span)),
                            Some(t) if !t.is_output() => problems.push((
                                codes::INVALID_TYPE_KIND,
                                span,
                                format!("The type of \"{name}.{}\" must be Output Type but got: {}.", field.name, field.ty),
                            )),
                            Some(_) => {}
                        }
                        for arg in field.arguments.values() {
                            self.check_input_ref(&arg.ty, span, &format!("{name}.{}({}:)", field.name, arg.name), &mut problems);
                        }
                    }
                }
                TypeDef::Union(union) => {
                    for member in &union.members {
                        match self.types.get(member) {
                            None => problems.push(unknown_type(member, span)),
                            Some(TypeDef::Object(_)) => {}
                            Some(_) => problems.push((
                                codes::INVALID_TYPE_KIND,
                                span,
                                format!("Union type \"{}\" can only include Object types, it cannot include \"{member}\".", union.name),
                            )),
                        }
                    }
                }
                TypeDef::InputObject(input) => {
                    for field in input.fields.values() {
                        self.check_input_ref(&field.ty, span, &format!("{}.{}", input.name, field.name), &mut problems);
                    }
                }
                TypeDef::Scalar(_) | TypeDef::Enum(_) => {}
            }
        }
        for directive in self.directives.values() {
            for arg in directive.arguments.values() {
                self.check_input_ref(&arg.ty, Span::default(), &format!("@{}({}:)", directive.name, arg.name), &mut problems);
            }
        }
        for (code, span, message) in problems {
            let title = if code == codes::UNDEFINED_TYPE {
                "unknown type"
            } else {
                "invalid type kind"
            };
            self.error(code, title, span, message);
        }
    }

    fn check_input_ref(
        &self,
        ty: &TypeRef,
        span: Span,
        owner: &str,
        problems: &mut Vec<(&'static str, Span, String)>,
    ) {
        match self.types.get(ty.name()) {
            None => problems.push(unknown_type(ty.name(), span)),
            Some(t) if !t.is_input() => problems.push((
                codes::INVALID_TYPE_KIND,
                span,
                format!("The type of \"{owner}\" must be Input Type but got: {ty}."),
            )),
            Some(_) => {}
        }
    }

    /// Picks the root types, falling back to the conventional names when no
    /// schema definition names them.
    fn resolve_roots(&mut self) -> (Option<String>, Option<String>, Option<String>) {
        let defaults = [
            (OperationType::Query, "Query"),
            (OperationType::Mutation, "Mutation"),
            (OperationType::Subscription, "Subscription"),
        ];
        let mut resolved = [None, None, None];
        for (slot, (operation, default_name)) in resolved.iter_mut().zip(defaults) {
            let (name, span) = match self.roots.get(&operation) {
                Some((name, span)) => (name.clone(), *span),
                None if self.has_schema_definition => continue,
                None if self.types.contains_key(default_name) => (
                    default_name.to_string(),
                    self.spans.get(default_name).copied().unwrap_or_default(),
                ),
                None => continue,
            };
            match self.types.get(&name) {
                None => {
                    let (code, span, message) = unknown_type(&name, span);
                    self.error(code, "unknown type", span, message);
                }
                Some(TypeDef::Object(_)) => *slot = Some(name),
                Some(other) => {
                    let message = format!(
                        "{} root type must be Object type, it cannot be {} \"{name}\".",
                        capitalize(operation.as_str()),
                        other.kind()
                    );
                    self.error(codes::INVALID_ROOT, "invalid root type", span, message);
                }
            }
        }
        let [query, mutation, subscription] = resolved;
        if query.is_none() && !self.roots.contains_key(&OperationType::Query) {
            self.error(
                codes::MISSING_ROOT,
                "missing query root",
                Span::default(),
                "Query root type must be provided.".to_string(),
            );
        }
        (query, mutation, subscription)
    }
}

fn unknown_type(name: &str, span: Span) -> (&'static str, Span, String) {
    (
        codes::UNDEFINED_TYPE,
        span,
        format!("Unknown type \"{name}\"."),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn convert_enum_value(value: &ast::EnumValueDefinition) -> EnumValueDef {
    let (deprecated, deprecation_reason) = deprecation(&value.directives);
    EnumValueDef {
        name: value.name.value.clone(),
        description: value.description.as_ref().map(|d| d.value.clone()),
        deprecated,
        deprecation_reason,
    }
}

fn deprecation(directives: &[ast::Directive]) -> (bool, Option<String>) {
    let Some(directive) = directives.iter().find(|d| d.name.value == "deprecated") else {
        return (false, None);
    };
    let reason = directive
        .arguments
        .iter()
        .find(|a| a.name.value == "reason")
        .and_then(|a| match &a.value {
            ast::Value::String(reason, _) => Some(reason.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "No longer supported".to_string());
    (true, Some(reason))
}
