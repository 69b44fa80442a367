//! Query execution.
//!
//! [`Executor::execute`] parses and validates a request, picks the
//! operation, coerces variables and then walks the selection sets, calling
//! resolvers and completing their values against the schema types.
//!
//! Field errors are recorded once, at the nearest field or list item whose
//! type is nullable; everything between the failure and that point
//! resolves to `null`.

use crate::context::Context;
use crate::executable::ExecutableSchema;
use crate::resolver::{ResolverArgs, ResolverInfo, ResolverMap};
use crate::response::{FieldError, PathSegment, Response};
use crate::schema::{FieldDef, Schema, TypeDef, TypeRef};
use crate::validation::validate;
use crate::values::{coerce_input, coerce_literal, serialize_leaf, value_from_ast};
use futures::future::{join_all, BoxFuture};
use indexmap::IndexMap;
use qlbridge_core::LineIndex;
use qlbridge_syntax::{
    parse_document, print_value, Directive, Document, Field, FragmentDefinition,
    OperationDefinition, OperationType, SelectionSet, SyntaxError, TYPENAME_FIELD,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum selection depth; deeper queries fail validation.
    pub max_depth: Option<usize>,
    /// Resolve sibling fields and list items concurrently. Top-level
    /// mutation fields always run one after another.
    pub parallel: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            parallel: true,
        }
    }
}

impl ExecutorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Resolves everything one field at a time.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// A request failure that prevented execution.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("{}", first_message(.0))]
    Validation(Vec<FieldError>),

    #[error("Must provide an operation.")]
    NoOperation,

    #[error("Must provide operation name if query contains multiple operations.")]
    AmbiguousOperation,

    #[error("Unknown operation named \"{0}\".")]
    UnknownOperation(String),

    #[error("Schema is not configured to execute {} operation.", .0.as_str())]
    UnsupportedOperation(OperationType),

    #[error("Subscription operations are not supported.")]
    SubscriptionsUnsupported,

    #[error("{}", first_message(.0))]
    Variables(Vec<FieldError>),
}

fn first_message(errors: &[FieldError]) -> &str {
    errors.first().map_or("", |e| e.message.as_str())
}

impl RequestError {
    /// Returns the failure as response errors.
    #[must_use]
    pub fn errors(&self) -> Vec<FieldError> {
        match self {
            Self::Syntax(err) => {
                let mut error = FieldError::new(err.to_string());
                for location in &err.locations {
                    error = error.with_location(*location);
                }
                vec![error]
            }
            Self::Validation(errors) | Self::Variables(errors) => errors.clone(),
            other => vec![FieldError::new(other.to_string())],
        }
    }
}

impl From<RequestError> for Response {
    fn from(err: RequestError) -> Self {
        Response::errors(err.errors())
    }
}

/// One GraphQL request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: Map<String, Value>,
    pub root_value: Value,
    pub context: Context,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn root_value(mut self, root_value: Value) -> Self {
        self.root_value = root_value;
        self
    }

    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

/// The query executor.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Executes a request against an executable schema.
    ///
    /// Problems that stop execution before it starts are returned as
    /// [`RequestError`]; field errors end up in the response.
    pub async fn execute(
        &self,
        schema: &ExecutableSchema,
        request: Request,
    ) -> Result<Response, RequestError> {
        let Request {
            query,
            operation_name,
            variables,
            root_value,
            context,
        } = request;

        let document = parse_document(&query)?;
        let index = LineIndex::new(&query);
        let errors = validate(schema.schema(), &document, &index, self.config.max_depth);
        if !errors.is_empty() {
            return Err(RequestError::Validation(errors));
        }

        let operation = select_operation(&document, operation_name.as_deref())?;
        let root_type = match (operation.operation, schema.schema().root_type(operation.operation)) {
            (OperationType::Subscription, Some(_)) => {
                return Err(RequestError::SubscriptionsUnsupported)
            }
            (_, Some(root)) => root,
            (kind, None) => return Err(RequestError::UnsupportedOperation(kind)),
        };
        let variables = coerce_variables(schema.schema(), operation, &variables, &index)?;

        let name = operation.name.as_ref().map(|n| n.value.clone());
        tracing::debug!(
            operation = name.as_deref().unwrap_or("<anonymous>"),
            kind = operation.operation.as_str(),
            "executing operation"
        );

        let ctx = ExecutionContext {
            schema: schema.schema(),
            resolvers: schema.resolvers(),
            fragments: document.fragments().map(|f| (f.name.as_str(), f)).collect(),
            variables,
            context: &context,
            operation_name: name,
            index: &index,
            parallel: self.config.parallel,
            errors: Mutex::new(Vec::new()),
        };

        let mut fields = FieldMap::new();
        ctx.collect_fields(
            root_type,
            &operation.selection_set,
            &mut fields,
            &mut FxHashSet::default(),
        );
        let serial = operation.operation == OperationType::Mutation || !ctx.parallel;
        let data = match ctx
            .execute_fields(root_type, &root_value, fields, Vec::new(), serial)
            .await
        {
            Ok(data) => data,
            Err(error) => {
                ctx.record(error).await;
                Value::Null
            }
        };

        let errors = ctx.errors.into_inner();
        tracing::debug!(errors = errors.len(), "operation finished");
        Ok(Response {
            data: Some(data),
            errors: (!errors.is_empty()).then_some(errors),
        })
    }
}

/// Executes `source` against `schema`.
///
/// `root_value` is the parent value of the root fields (`null` when
/// absent); `variables` are coerced against the operation's variable
/// definitions.
pub async fn graphql(
    schema: &ExecutableSchema,
    source: &str,
    root_value: Option<Value>,
    context: Context,
    variables: Option<Map<String, Value>>,
    operation_name: Option<&str>,
) -> Result<Response, RequestError> {
    let request = Request {
        query: source.to_string(),
        operation_name: operation_name.map(str::to_string),
        variables: variables.unwrap_or_default(),
        root_value: root_value.unwrap_or(Value::Null),
        context,
    };
    Executor::new().execute(schema, request).await
}

fn select_operation<'d>(
    document: &'d Document,
    operation_name: Option<&str>,
) -> Result<&'d OperationDefinition, RequestError> {
    match operation_name {
        Some(name) => document
            .operations()
            .find(|op| op.name.as_ref().is_some_and(|n| n.value == name))
            .ok_or_else(|| RequestError::UnknownOperation(name.to_string())),
        None => {
            let mut operations = document.operations();
            match (operations.next(), operations.next()) {
                (Some(op), None) => Ok(op),
                (None, _) => Err(RequestError::NoOperation),
                (Some(_), Some(_)) => Err(RequestError::AmbiguousOperation),
            }
        }
    }
}

fn coerce_variables(
    schema: &Schema,
    operation: &OperationDefinition,
    inputs: &Map<String, Value>,
    index: &LineIndex,
) -> Result<Map<String, Value>, RequestError> {
    let mut coerced = Map::new();
    let mut errors = Vec::new();
    for def in &operation.variables {
        let name = def.name.as_str();
        let ty = TypeRef::from_ast(&def.ty);
        let location = index.location(def.span.start);
        match inputs.get(name) {
            Some(value) => match coerce_input(schema, &ty, value) {
                Ok(value) => {
                    coerced.insert(name.to_string(), value);
                }
                Err(reason) => errors.push(
                    FieldError::new(format!(
                        "Variable \"${name}\" got invalid value {value}; {reason}"
                    ))
                    .with_location(location),
                ),
            },
            None => match &def.default_value {
                Some(default) => match coerce_literal(schema, &ty, default, &Map::new()) {
                    Ok(Some(value)) => {
                        coerced.insert(name.to_string(), value);
                    }
                    Ok(None) => {}
                    Err(reason) => errors.push(
                        FieldError::new(format!(
                            "Variable \"${name}\" has invalid default value {}; {reason}",
                            print_value(default)
                        ))
                        .with_location(location),
                    ),
                },
                None if ty.is_non_null() => errors.push(
                    FieldError::new(format!(
                        "Variable \"${name}\" of required type \"{ty}\" was not provided."
                    ))
                    .with_location(location),
                ),
                None => {}
            },
        }
    }
    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(RequestError::Variables(errors))
    }
}

/// Fields grouped by response key, in selection order.
type FieldMap<'a> = IndexMap<String, Vec<&'a Field>>;

/// State shared by every field of one operation.
struct ExecutionContext<'a> {
    schema: &'a Schema,
    resolvers: &'a ResolverMap,
    fragments: FxHashMap<&'a str, &'a FragmentDefinition>,
    variables: Map<String, Value>,
    context: &'a Context,
    operation_name: Option<String>,
    index: &'a LineIndex,
    parallel: bool,
    errors: Mutex<Vec<FieldError>>,
}

impl<'a> ExecutionContext<'a> {
    async fn record(&self, error: FieldError) {
        tracing::debug!(path = ?error.path, message = %error.message, "field error");
        self.errors.lock().await.push(error);
    }

    fn located(&self, message: String, field: &Field, path: &[PathSegment]) -> FieldError {
        FieldError::new(message)
            .with_location(self.index.location(field.span.start))
            .with_path(path.to_vec())
    }

    /// Records `error` if `ty` is nullable, otherwise hands it to the parent.
    async fn handle_error(&self, ty: &TypeRef, error: FieldError) -> Result<Value, FieldError> {
        if ty.is_non_null() {
            return Err(error);
        }
        self.record(error).await;
        Ok(Value::Null)
    }

    fn should_include(&self, directives: &[Directive]) -> bool {
        for directive in directives {
            let condition = directive
                .arguments
                .iter()
                .find(|arg| arg.name.value == "if")
                .and_then(|arg| value_from_ast(&arg.value, &self.variables).as_bool());
            match directive.name.as_str() {
                "skip" if condition == Some(true) => return false,
                "include" if condition != Some(true) => return false,
                _ => {}
            }
        }
        true
    }

    fn applies(&self, condition: &str, object_type: &str) -> bool {
        condition == object_type || self.schema.is_possible_type(condition, object_type)
    }

    fn collect_fields(
        &self,
        object_type: &str,
        set: &'a SelectionSet,
        fields: &mut FieldMap<'a>,
        visited: &mut FxHashSet<&'a str>,
    ) {
        for selection in &set.selections {
            match selection {
                qlbridge_syntax::Selection::Field(field) => {
                    if self.should_include(&field.directives) {
                        fields
                            .entry(field.response_key().to_string())
                            .or_default()
                            .push(field);
                    }
                }
                qlbridge_syntax::Selection::InlineFragment(inline) => {
                    let applies = inline
                        .type_condition
                        .as_ref()
                        .map_or(true, |cond| self.applies(cond.as_str(), object_type));
                    if applies && self.should_include(&inline.directives) {
                        self.collect_fields(object_type, &inline.selection_set, fields, visited);
                    }
                }
                qlbridge_syntax::Selection::FragmentSpread(spread) => {
                    if !self.should_include(&spread.directives)
                        || !visited.insert(spread.name.as_str())
                    {
                        continue;
                    }
                    let Some(&fragment) = self.fragments.get(spread.name.as_str()) else {
                        continue;
                    };
                    if self.applies(fragment.type_condition.as_str(), object_type) {
                        self.collect_fields(object_type, &fragment.selection_set, fields, visited);
                    }
                }
            }
        }
    }

    fn execute_fields<'b>(
        &'b self,
        parent_type: &'b str,
        parent: &'b Value,
        fields: FieldMap<'a>,
        path: Vec<PathSegment>,
        serial: bool,
    ) -> BoxFuture<'b, Result<Value, FieldError>> {
        Box::pin(async move {
            let mut out = Map::new();
            if serial {
                for (key, nodes) in fields {
                    let field_path = child_path(&path, &key);
                    let value = self.execute_field(parent_type, parent, nodes, field_path).await?;
                    out.insert(key, value);
                }
            } else {
                let pending = fields.into_iter().map(|(key, nodes)| {
                    let field_path = child_path(&path, &key);
                    async move {
                        let value = self.execute_field(parent_type, parent, nodes, field_path).await;
                        (key, value)
                    }
                });
                for (key, value) in join_all(pending).await {
                    out.insert(key, value?);
                }
            }
            Ok(Value::Object(out))
        })
    }

    async fn execute_field(
        &self,
        parent_type: &str,
        parent: &Value,
        nodes: Vec<&'a Field>,
        path: Vec<PathSegment>,
    ) -> Result<Value, FieldError> {
        let field = nodes[0];
        let name = field.name.as_str();
        if name == TYPENAME_FIELD {
            return Ok(Value::String(parent_type.to_string()));
        }
        let Some(def) = self.schema.field(parent_type, name) else {
            return Ok(Value::Null);
        };

        let args = match self.coerce_arguments(def, field) {
            Ok(args) => args,
            Err(message) => {
                let error = self.located(message, field, &path);
                return self.handle_error(&def.ty, error).await;
            }
        };
        let info = ResolverInfo::new(name, parent_type)
            .with_return_type(def.ty.to_string())
            .with_path(path.clone())
            .with_selected_fields(selected_fields(&nodes))
            .with_operation_name(self.operation_name.clone());

        let resolver = self.resolvers.get(parent_type, name);
        let completed = match resolver.resolve(parent, &args, self.context, &info).await {
            Ok(value) => {
                self.complete_value(&def.ty, parent_type, &nodes, value, path.clone())
                    .await
            }
            Err(err) => Err(self.located(err.to_string(), field, &path)),
        };
        match completed {
            Ok(value) => Ok(value),
            Err(error) => self.handle_error(&def.ty, error).await,
        }
    }

    fn coerce_arguments(&self, def: &FieldDef, field: &Field) -> Result<ResolverArgs, String> {
        let mut args = ResolverArgs::new();
        for (name, arg_def) in &def.arguments {
            let provided = field.arguments.iter().find(|a| a.name.value == *name);
            let value = match provided {
                Some(arg) => coerce_literal(self.schema, &arg_def.ty, &arg.value, &self.variables)
                    .map_err(|reason| {
                        format!(
                            "Argument \"{name}\" has invalid value {}. {reason}",
                            print_value(&arg.value)
                        )
                    })?,
                None => None,
            };
            match value.or_else(|| arg_def.default_value.clone()) {
                Some(value) => args.set(name.clone(), value),
                None if arg_def.ty.is_non_null() => {
                    return Err(format!(
                        "Argument \"{name}\" of required type \"{}\" was not provided.",
                        arg_def.ty
                    ))
                }
                None => {}
            }
        }
        Ok(args)
    }

    fn complete_value<'b>(
        &'b self,
        ty: &'b TypeRef,
        parent_type: &'b str,
        nodes: &'b [&'a Field],
        value: Value,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Result<Value, FieldError>> {
        Box::pin(async move {
            let field = nodes[0];
            match ty {
                TypeRef::NonNull(inner) => {
                    let completed = self
                        .complete_value(inner, parent_type, nodes, value, path.clone())
                        .await?;
                    if completed.is_null() {
                        return Err(self.located(
                            format!(
                                "Cannot return null for non-nullable field {parent_type}.{}.",
                                field.name
                            ),
                            field,
                            &path,
                        ));
                    }
                    Ok(completed)
                }
                _ if value.is_null() => Ok(Value::Null),
                TypeRef::List(inner) => {
                    let Value::Array(items) = value else {
                        return Err(self.located(
                            format!(
                                "Expected Iterable, but did not find one for field \"{parent_type}.{}\".",
                                field.name
                            ),
                            field,
                            &path,
                        ));
                    };
                    let pending: Vec<_> = items
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| {
                            let mut item_path = path.clone();
                            item_path.push(PathSegment::Index(i));
                            async move {
                                match self
                                    .complete_value(inner, parent_type, nodes, item, item_path)
                                    .await
                                {
                                    Ok(value) => Ok(value),
                                    Err(error) => self.handle_error(inner, error).await,
                                }
                            }
                        })
                        .collect();
                    let completed = if self.parallel {
                        join_all(pending).await
                    } else {
                        let mut completed = Vec::with_capacity(pending.len());
                        for item in pending {
                            completed.push(item.await);
                        }
                        completed
                    };
                    completed
                        .into_iter()
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array)
                }
                TypeRef::Named(type_name) => {
                    self.complete_named(type_name, parent_type, nodes, value, path)
                        .await
                }
            }
        })
    }

    async fn complete_named(
        &self,
        type_name: &str,
        parent_type: &str,
        nodes: &[&'a Field],
        value: Value,
        path: Vec<PathSegment>,
    ) -> Result<Value, FieldError> {
        let field = nodes[0];
        let Some(def) = self.schema.get_type(type_name) else {
            return Ok(Value::Null);
        };
        if def.is_leaf() {
            return serialize_leaf(def, &value).map_err(|message| self.located(message, field, &path));
        }
        let object_type = if def.is_abstract() {
            self.resolve_runtime_type(def, &value, parent_type, field)
                .map_err(|message| self.located(message, field, &path))?
        } else {
            def.name().to_string()
        };

        let mut fields = FieldMap::new();
        let mut visited = FxHashSet::default();
        for &node in nodes {
            if let Some(set) = &node.selection_set {
                self.collect_fields(&object_type, set, &mut fields, &mut visited);
            }
        }
        self.execute_fields(&object_type, &value, fields, path, !self.parallel)
            .await
    }

    /// Picks the object type for a value of an interface or union: its
    /// `__typename`, then the registered type resolver, then the first
    /// possible type.
    fn resolve_runtime_type(
        &self,
        def: &TypeDef,
        value: &Value,
        parent_type: &str,
        field: &Field,
    ) -> Result<String, String> {
        let abstract_type = def.name();
        let candidate = value
            .get(TYPENAME_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.resolvers.resolve_type(abstract_type, value, self.context))
            .or_else(|| {
                self.schema
                    .possible_types(abstract_type)
                    .first()
                    .map(|name| (*name).to_string())
            });
        match candidate {
            Some(name) if self.schema.is_possible_type(abstract_type, &name) => Ok(name),
            Some(name) => Err(format!(
                "Runtime Object type \"{name}\" is not a possible type for \"{abstract_type}\"."
            )),
            None => Err(format!(
                "Abstract type \"{abstract_type}\" must resolve to an Object type at runtime for field \"{parent_type}.{}\".",
                field.name
            )),
        }
    }
}

fn child_path(path: &[PathSegment], key: &str) -> Vec<PathSegment> {
    let mut child = Vec::with_capacity(path.len() + 1);
    child.extend_from_slice(path);
    child.push(PathSegment::Field(key.to_string()));
    child
}

fn selected_fields(nodes: &[&Field]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|node| node.selection_set.as_ref())
        .flat_map(|set| &set.selections)
        .filter_map(|selection| match selection {
            qlbridge_syntax::Selection::Field(field) => Some(field.name.value.clone()),
            _ => None,
        })
        .collect()
}
