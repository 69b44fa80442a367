//! Static checks run on an executable document before execution.
//!
//! Covers the rules execution depends on: executable definitions only,
//! unique operation and fragment names, known fields, arguments, types and
//! fragments, leaf/composite selection shape, fragment cycles and an
//! optional depth limit.

use crate::response::FieldError;
use crate::schema::{Schema, TypeDef};
use qlbridge_core::{LineIndex, Span};
use qlbridge_syntax::{
    Definition, Document, FragmentDefinition, Selection, SelectionSet, TYPENAME_FIELD,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Validates `document` against `schema`, returning every error found.
#[must_use]
pub fn validate(
    schema: &Schema,
    document: &Document,
    index: &LineIndex,
    max_depth: Option<usize>,
) -> Vec<FieldError> {
    let mut validator = Validator {
        schema,
        index,
        fragments: FxHashMap::default(),
        max_depth,
        depth_reported: false,
        errors: Vec::new(),
    };
    validator.check_definitions(document);
    for op in document.operations() {
        for var in &op.variables {
            let type_name = var.ty.named_type();
            match schema.get_type(type_name) {
                None => validator.error(format!("Unknown type \"{type_name}\"."), var.ty.span()),
                Some(ty) if !ty.is_input() => validator.error(
                    format!(
                        "Variable \"${}\" cannot be non-input type \"{}\".",
                        var.name, var.ty
                    ),
                    var.ty.span(),
                ),
                Some(_) => {}
            }
        }
        if let Some(root) = schema.root_type(op.operation) {
            let mut visiting = Vec::new();
            validator.walk(root, &op.selection_set, 1, &mut visiting);
        }
    }
    for fragment in document.fragments() {
        if let Some(condition) = validator.check_condition(
            &fragment.type_condition.value,
            fragment.type_condition.span,
            Some(&fragment.name.value),
        ) {
            // Depth is measured from operations only.
            let mut visiting = vec![fragment.name.as_str()];
            let saved = validator.max_depth.take();
            validator.walk(condition, &fragment.selection_set, 1, &mut visiting);
            validator.max_depth = saved;
        }
    }
    validator.errors
}

struct Validator<'a> {
    schema: &'a Schema,
    index: &'a LineIndex,
    fragments: FxHashMap<&'a str, &'a FragmentDefinition>,
    max_depth: Option<usize>,
    depth_reported: bool,
    errors: Vec<FieldError>,
}

impl<'a> Validator<'a> {
    fn error(&mut self, message: String, span: Span) {
        self.errors
            .push(FieldError::new(message).with_location(self.index.location(span.start)));
    }

    fn check_definitions(&mut self, document: &'a Document) {
        let mut operation_names = FxHashSet::default();
        let operation_count = document.operations().count();
        for def in &document.definitions {
            match def {
                Definition::Operation(op) => match &op.name {
                    Some(name) => {
                        if !operation_names.insert(name.as_str()) {
                            self.error(
                                format!("There can be only one operation named \"{name}\"."),
                                name.span,
                            );
                        }
                    }
                    None if operation_count > 1 => self.error(
                        "This anonymous operation must be the only defined operation."
                            .to_string(),
                        op.span,
                    ),
                    None => {}
                },
                Definition::Fragment(fragment) => {
                    if self
                        .fragments
                        .insert(fragment.name.as_str(), fragment)
                        .is_some()
                    {
                        self.error(
                            format!(
                                "There can be only one fragment named \"{}\".",
                                fragment.name
                            ),
                            fragment.name.span,
                        );
                    }
                }
                Definition::Schema(_) | Definition::SchemaExtension(_) => {
                    self.error("The schema definition is not executable.".to_string(), def.span());
                }
                Definition::Type(ty) | Definition::TypeExtension(ty) => self.error(
                    format!("The \"{}\" definition is not executable.", ty.name()),
                    def.span(),
                ),
                Definition::Directive(directive) => self.error(
                    format!("The \"@{}\" definition is not executable.", directive.name),
                    def.span(),
                ),
            }
        }
    }

    /// Checks a fragment type condition, returning the type name when the
    /// selection below it can be walked.
    fn check_condition(
        &mut self,
        type_name: &'a str,
        span: Span,
        fragment: Option<&str>,
    ) -> Option<&'a str> {
        let schema = self.schema;
        match schema.get_type(type_name) {
            None => {
                self.error(format!("Unknown type \"{type_name}\"."), span);
                None
            }
            Some(ty) if ty.is_leaf() || matches!(ty, TypeDef::InputObject(_)) => {
                let message = match fragment {
                    Some(name) => format!(
                        "Fragment \"{name}\" cannot condition on non composite type \"{type_name}\"."
                    ),
                    None => format!(
                        "Fragment cannot condition on non composite type \"{type_name}\"."
                    ),
                };
                self.error(message, span);
                None
            }
            Some(_) => Some(type_name),
        }
    }

    fn walk(
        &mut self,
        parent_type: &'a str,
        set: &'a SelectionSet,
        depth: usize,
        visiting: &mut Vec<&'a str>,
    ) {
        let schema = self.schema;
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    let name = field.name.as_str();
                    if name == TYPENAME_FIELD {
                        continue;
                    }
                    let Some(def) = schema.field(parent_type, name) else {
                        self.error(
                            format!("Cannot query field \"{name}\" on type \"{parent_type}\"."),
                            field.name.span,
                        );
                        continue;
                    };
                    for arg in &field.arguments {
                        if !def.arguments.contains_key(arg.name.as_str()) {
                            self.error(
                                format!(
                                    "Unknown argument \"{}\" on field \"{parent_type}.{name}\".",
                                    arg.name
                                ),
                                arg.span,
                            );
                        }
                    }
                    for (arg_name, arg_def) in &def.arguments {
                        let provided = field.arguments.iter().any(|a| a.name.value == *arg_name);
                        if !provided && arg_def.ty.is_non_null() && arg_def.default_value.is_none() {
                            self.error(
                                format!(
                                    "Field \"{name}\" argument \"{arg_name}\" of type \"{}\" is required, but it was not provided.",
                                    arg_def.ty
                                ),
                                field.span,
                            );
                        }
                    }

                    let is_leaf = schema
                        .get_type(def.ty.name())
                        .map_or(true, TypeDef::is_leaf);
                    match (&field.selection_set, is_leaf) {
                        (Some(_), true) => self.error(
                            format!(
                                "Field \"{name}\" must not have a selection since type \"{}\" has no subfields.",
                                def.ty
                            ),
                            field.span,
                        ),
                        (None, false) => self.error(
                            format!(
                                "Field \"{name}\" of type \"{}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?",
                                def.ty
                            ),
                            field.span,
                        ),
                        (Some(child), false) => {
                            if let Some(max) = self.max_depth {
                                if depth + 1 > max && !self.depth_reported {
                                    self.depth_reported = true;
                                    self.error(
                                        format!("Query depth exceeds the maximum of {max}."),
                                        child.span,
                                    );
                                }
                            }
                            self.walk(def.ty.name(), child, depth + 1, visiting);
                        }
                        (None, true) => {}
                    }
                }
                Selection::InlineFragment(inline) => {
                    let condition = match &inline.type_condition {
                        Some(cond) => self.check_condition(&cond.value, cond.span, None),
                        None => Some(parent_type),
                    };
                    if let Some(condition) = condition {
                        self.walk(condition, &inline.selection_set, depth, visiting);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.name.as_str();
                    let Some(&fragment) = self.fragments.get(name) else {
                        self.error(format!("Unknown fragment \"{name}\"."), spread.name.span);
                        continue;
                    };
                    if visiting.contains(&name) {
                        self.error(
                            format!("Cannot spread fragment \"{name}\" within itself."),
                            spread.span,
                        );
                        continue;
                    }
                    // Conditions are reported once, when the fragment itself is checked.
                    let condition = fragment.type_condition.as_str();
                    let composite = schema
                        .get_type(condition)
                        .is_some_and(|ty| !ty.is_leaf() && !matches!(ty, TypeDef::InputObject(_)));
                    if composite {
                        visiting.push(fragment.name.as_str());
                        self.walk(condition, &fragment.selection_set, depth, visiting);
                        visiting.pop();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlbridge_syntax::parse_document;

    const SDL: &str = r#"
        type Post { id: ID!, title: String, author: User }
        type User { id: ID!, posts: [Post] }
        type Query { posts: [Post], post(id: ID!): Post, version: String }
    "#;

    fn messages(query: &str, max_depth: Option<usize>) -> Vec<String> {
        let schema = Schema::parse(SDL).unwrap();
        let document = parse_document(query).unwrap();
        validate(&schema, &document, &LineIndex::new(query), max_depth)
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn test_valid_query_passes() {
        assert!(messages(
            "query Q { posts { id ...F } } fragment F on Post { title author { __typename } }",
            None
        )
        .is_empty());
    }

    #[test]
    fn test_unknown_field_and_argument() {
        assert_eq!(
            messages("{ posts { nope } post(id: 1, x: 2) { id } }", None),
            [
                "Cannot query field \"nope\" on type \"Post\".",
                "Unknown argument \"x\" on field \"Query.post\".",
            ]
        );
    }

    #[test]
    fn test_missing_required_argument() {
        assert_eq!(
            messages("{ post { id } }", None),
            ["Field \"post\" argument \"id\" of type \"ID!\" is required, but it was not provided."]
        );
    }

    #[test]
    fn test_selection_shape() {
        assert_eq!(
            messages("{ posts version { length } }", None),
            [
                "Field \"posts\" of type \"[Post]\" must have a selection of subfields. Did you mean \"posts { ... }\"?",
                "Field \"version\" must not have a selection since type \"String\" has no subfields.",
            ]
        );
    }

    #[test]
    fn test_fragment_rules() {
        assert_eq!(
            messages("{ ...Missing posts { ... on Nope { id } } }", None),
            ["Unknown fragment \"Missing\".", "Unknown type \"Nope\"."]
        );
        let cyclic = messages("{ posts { ...A } } fragment A on Post { ...A }", None);
        assert!(cyclic.contains(&"Cannot spread fragment \"A\" within itself.".to_string()));
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(
            messages("query A { version } query A { version }", None),
            ["There can be only one operation named \"A\"."]
        );
        assert_eq!(
            messages("{ version } query B { version }", None),
            ["This anonymous operation must be the only defined operation."]
        );
    }

    #[test]
    fn test_type_system_definitions_are_rejected() {
        assert_eq!(
            messages("{ version } type Extra { a: Int }", None),
            ["The \"Extra\" definition is not executable."]
        );
    }

    #[test]
    fn test_depth_limit() {
        let query = "{ posts { author { posts { id } } } }";
        assert!(messages(query, Some(4)).is_empty());
        assert_eq!(
            messages(query, Some(3)),
            ["Query depth exceeds the maximum of 3."]
        );
    }

    #[test]
    fn test_errors_carry_locations() {
        let schema = Schema::parse(SDL).unwrap();
        let query = "{\n  nope\n}";
        let errors = validate(&schema, &parse_document(query).unwrap(), &LineIndex::new(query), None);
        assert_eq!(
            errors[0].locations.as_deref(),
            Some(&[qlbridge_core::Location { line: 2, column: 3 }][..])
        );
    }
}
