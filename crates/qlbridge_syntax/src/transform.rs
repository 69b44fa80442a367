//! Document rewrites applied before execution.

use crate::ast::*;
use qlbridge_core::Span;

/// The introspection field naming an object's concrete type.
pub const TYPENAME_FIELD: &str = "__typename";

/// Returns a copy of `document` with `__typename` selected in every nested
/// selection set.
///
/// Root selection sets of operations are left alone, as are sets that
/// already select `__typename` without an alias. Fragment definitions are
/// treated as nested since they always apply below the root.
#[must_use]
pub fn add_typename(document: &Document) -> Document {
    let mut document = document.clone();
    for def in &mut document.definitions {
        match def {
            Definition::Operation(op) => add_to_children(&mut op.selection_set),
            Definition::Fragment(fragment) => add_to_set(&mut fragment.selection_set),
            _ => {}
        }
    }
    document
}

fn add_to_set(set: &mut SelectionSet) {
    let has_typename = set.selections.iter().any(|selection| {
        matches!(selection, Selection::Field(f) if f.alias.is_none() && f.name.value == TYPENAME_FIELD)
    });
    add_to_children(set);
    if !has_typename {
        set.selections.push(Selection::Field(typename_field(set.span)));
    }
}

fn add_to_children(set: &mut SelectionSet) {
    for selection in &mut set.selections {
        match selection {
            Selection::Field(field) => {
                if let Some(child) = &mut field.selection_set {
                    add_to_set(child);
                }
            }
            // Inline fragments share their parent's type, which already
            // receives the field.
            Selection::InlineFragment(inline) => add_to_children(&mut inline.selection_set),
            Selection::FragmentSpread(_) => {}
        }
    }
}

fn typename_field(parent: Span) -> Field {
    let span = Span::empty(parent.end);
    Field {
        alias: None,
        name: Name::new(TYPENAME_FIELD, span),
        arguments: Vec::new(),
        directives: Vec::new(),
        selection_set: None,
        span,
    }
}
