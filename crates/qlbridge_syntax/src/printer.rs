//! Printing documents back to GraphQL source.
//!
//! Output follows the layout of the reference GraphQL printer: two-space
//! indentation, one selection per line and a blank line between
//! definitions.

use crate::ast::*;

/// Printing options.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Number of spaces for indentation.
    pub indent_size: usize,
    /// Field arguments wrap onto separate lines past this width.
    pub max_line_length: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            max_line_length: 80,
        }
    }
}

/// Document printer.
pub struct Printer {
    options: PrintOptions,
    output: String,
    indent: usize,
}

impl Printer {
    /// Creates a new printer.
    #[must_use]
    pub fn new(options: PrintOptions) -> Self {
        Self {
            options,
            output: String::new(),
            indent: 0,
        }
    }

    /// Prints a document.
    pub fn print(&mut self, document: &Document) -> String {
        self.output.clear();
        self.indent = 0;

        for (i, def) in document.definitions.iter().enumerate() {
            if i > 0 {
                self.output.push_str("\n\n");
            }
            self.print_definition(def);
        }

        std::mem::take(&mut self.output)
    }

    fn print_definition(&mut self, def: &Definition) {
        match def {
            Definition::Schema(s) => self.print_schema(s),
            Definition::SchemaExtension(s) => {
                self.output.push_str("extend ");
                self.print_schema(s);
            }
            Definition::Type(t) => self.print_type_definition(t),
            Definition::TypeExtension(t) => {
                self.output.push_str("extend ");
                self.print_type_definition(t);
            }
            Definition::Directive(d) => self.print_directive_definition(d),
            Definition::Operation(o) => self.print_operation(o),
            Definition::Fragment(f) => self.print_fragment(f),
        }
    }

    // =========================================================================
    // Executable definitions
    // =========================================================================

    fn print_operation(&mut self, op: &OperationDefinition) {
        let anonymous = op.operation == OperationType::Query
            && op.name.is_none()
            && op.variables.is_empty()
            && op.directives.is_empty();

        if !anonymous {
            self.output.push_str(op.operation.as_str());
            match &op.name {
                Some(name) => {
                    self.output.push(' ');
                    self.output.push_str(&name.value);
                }
                None if !op.variables.is_empty() => self.output.push(' '),
                None => {}
            }
            if !op.variables.is_empty() {
                self.output.push('(');
                for (i, var) in op.variables.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.print_variable_definition(var);
                }
                self.output.push(')');
            }
            self.print_directives(&op.directives);
            self.output.push(' ');
        }

        self.print_selection_set(&op.selection_set);
    }

    fn print_variable_definition(&mut self, var: &VariableDefinition) {
        self.output.push('$');
        self.output.push_str(&var.name.value);
        self.output.push_str(": ");
        self.output.push_str(&var.ty.to_string());
        if let Some(default) = &var.default_value {
            self.output.push_str(" = ");
            write_value(&mut self.output, default);
        }
        self.print_directives(&var.directives);
    }

    fn print_fragment(&mut self, fragment: &FragmentDefinition) {
        self.output.push_str("fragment ");
        self.output.push_str(&fragment.name.value);
        self.output.push_str(" on ");
        self.output.push_str(&fragment.type_condition.value);
        self.print_directives(&fragment.directives);
        self.output.push(' ');
        self.print_selection_set(&fragment.selection_set);
    }

    fn print_selection_set(&mut self, set: &SelectionSet) {
        self.output.push_str("{\n");
        self.indent += 1;
        for selection in &set.selections {
            self.push_indent();
            self.print_selection(selection);
            self.output.push('\n');
        }
        self.indent -= 1;
        self.push_indent();
        self.output.push('}');
    }

    fn print_selection(&mut self, selection: &Selection) {
        match selection {
            Selection::Field(field) => self.print_field(field),
            Selection::FragmentSpread(spread) => {
                self.output.push_str("...");
                self.output.push_str(&spread.name.value);
                self.print_directives(&spread.directives);
            }
            Selection::InlineFragment(inline) => {
                self.output.push_str("...");
                if let Some(condition) = &inline.type_condition {
                    self.output.push_str(" on ");
                    self.output.push_str(&condition.value);
                }
                self.print_directives(&inline.directives);
                self.output.push(' ');
                self.print_selection_set(&inline.selection_set);
            }
        }
    }

    fn print_field(&mut self, field: &Field) {
        let start = self.output.len();
        if let Some(alias) = &field.alias {
            self.output.push_str(&alias.value);
            self.output.push_str(": ");
        }
        self.output.push_str(&field.name.value);

        if !field.arguments.is_empty() {
            let args: Vec<String> = field.arguments.iter().map(argument_to_string).collect();
            let line_length = self.output.len() - start + args.iter().map(|a| a.len() + 2).sum::<usize>();
            if line_length > self.options.max_line_length {
                self.output.push_str("(\n");
                self.indent += 1;
                for arg in &args {
                    self.push_indent();
                    self.output.push_str(arg);
                    self.output.push('\n');
                }
                self.indent -= 1;
                self.push_indent();
                self.output.push(')');
            } else {
                self.output.push('(');
                self.output.push_str(&args.join(", "));
                self.output.push(')');
            }
        }

        self.print_directives(&field.directives);

        if let Some(set) = &field.selection_set {
            self.output.push(' ');
            self.print_selection_set(set);
        }
    }

    fn print_directives(&mut self, directives: &[Directive]) {
        for directive in directives {
            self.output.push_str(" @");
            self.output.push_str(&directive.name.value);
            if !directive.arguments.is_empty() {
                self.output.push('(');
                for (i, arg) in directive.arguments.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.output.push_str(&argument_to_string(arg));
                }
                self.output.push(')');
            }
        }
    }

    // =========================================================================
    // Type system definitions
    // =========================================================================

    fn print_schema(&mut self, schema: &SchemaDefinition) {
        self.print_description(schema.description.as_ref());
        self.output.push_str("schema");
        self.print_directives(&schema.directives);
        self.print_block(&schema.operations, |p, op| {
            p.output.push_str(op.operation.as_str());
            p.output.push_str(": ");
            p.output.push_str(&op.type_name.value);
        });
    }

    fn print_type_definition(&mut self, def: &TypeDefinition) {
        match def {
            TypeDefinition::Object(t) => {
                self.print_description(t.description.as_ref());
                self.print_type_header("type", &t.name);
                self.print_implements(&t.implements);
                self.print_directives(&t.directives);
                self.print_block(&t.fields, Self::print_field_definition);
            }
            TypeDefinition::Interface(t) => {
                self.print_description(t.description.as_ref());
                self.print_type_header("interface", &t.name);
                self.print_implements(&t.implements);
                self.print_directives(&t.directives);
                self.print_block(&t.fields, Self::print_field_definition);
            }
            TypeDefinition::Union(t) => {
                self.print_description(t.description.as_ref());
                self.print_type_header("union", &t.name);
                self.print_directives(&t.directives);
                if !t.members.is_empty() {
                    self.output.push_str(" = ");
                    for (i, member) in t.members.iter().enumerate() {
                        if i > 0 {
                            self.output.push_str(" | ");
                        }
                        self.output.push_str(&member.value);
                    }
                }
            }
            TypeDefinition::Enum(t) => {
                self.print_description(t.description.as_ref());
                self.print_type_header("enum", &t.name);
                self.print_directives(&t.directives);
                self.print_block(&t.values, |p, value| {
                    p.print_description(value.description.as_ref());
                    p.output.push_str(&value.name.value);
                    p.print_directives(&value.directives);
                });
            }
            TypeDefinition::InputObject(t) => {
                self.print_description(t.description.as_ref());
                self.print_type_header("input", &t.name);
                self.print_directives(&t.directives);
                self.print_block(&t.fields, Self::print_input_value);
            }
            TypeDefinition::Scalar(t) => {
                self.print_description(t.description.as_ref());
                self.print_type_header("scalar", &t.name);
                self.print_directives(&t.directives);
            }
        }
    }

    fn print_type_header(&mut self, keyword: &str, name: &Name) {
        self.output.push_str(keyword);
        self.output.push(' ');
        self.output.push_str(&name.value);
    }

    fn print_implements(&mut self, interfaces: &[Name]) {
        for (i, interface) in interfaces.iter().enumerate() {
            self.output.push_str(if i == 0 { " implements " } else { " & " });
            self.output.push_str(&interface.value);
        }
    }

    fn print_field_definition(&mut self, field: &FieldDefinition) {
        self.print_description(field.description.as_ref());
        self.output.push_str(&field.name.value);
        self.print_argument_definitions(&field.arguments);
        self.output.push_str(": ");
        self.output.push_str(&field.ty.to_string());
        self.print_directives(&field.directives);
    }

    fn print_argument_definitions(&mut self, arguments: &[InputValueDefinition]) {
        if arguments.is_empty() {
            return;
        }
        if arguments.iter().any(|a| a.description.is_some()) {
            self.output.push_str("(\n");
            self.indent += 1;
            for arg in arguments {
                self.push_indent();
                self.print_input_value(arg);
                self.output.push('\n');
            }
            self.indent -= 1;
            self.push_indent();
            self.output.push(')');
        } else {
            self.output.push('(');
            for (i, arg) in arguments.iter().enumerate() {
                if i > 0 {
                    self.output.push_str(", ");
                }
                self.print_input_value(arg);
            }
            self.output.push(')');
        }
    }

    fn print_input_value(&mut self, value: &InputValueDefinition) {
        self.print_description(value.description.as_ref());
        self.output.push_str(&value.name.value);
        self.output.push_str(": ");
        self.output.push_str(&value.ty.to_string());
        if let Some(default) = &value.default_value {
            self.output.push_str(" = ");
            write_value(&mut self.output, default);
        }
        self.print_directives(&value.directives);
    }

    fn print_directive_definition(&mut self, def: &DirectiveDefinition) {
        self.print_description(def.description.as_ref());
        self.output.push_str("directive @");
        self.output.push_str(&def.name.value);
        self.print_argument_definitions(&def.arguments);
        if def.repeatable {
            self.output.push_str(" repeatable");
        }
        self.output.push_str(" on ");
        for (i, location) in def.locations.iter().enumerate() {
            if i > 0 {
                self.output.push_str(" | ");
            }
            self.output.push_str(location.as_str());
        }
    }

    /// Prints ` {` items `}`, or nothing for an empty list.
    fn print_block<T>(&mut self, items: &[T], mut print_item: impl FnMut(&mut Self, &T)) {
        if items.is_empty() {
            return;
        }
        self.output.push_str(" {\n");
        self.indent += 1;
        for item in items {
            self.push_indent();
            print_item(self, item);
            self.output.push('\n');
        }
        self.indent -= 1;
        self.push_indent();
        self.output.push('}');
    }

    /// Prints a description followed by a line break at the current indent.
    fn print_description(&mut self, description: Option<&Description>) {
        let Some(desc) = description else {
            return;
        };

        if !desc.block {
            write_string(&mut self.output, &desc.value);
        } else {
            let escaped = desc.value.replace("\"\"\"", "\\\"\"\"");
            let multi_line = escaped.contains('\n')
                || escaped.len() > 70
                || escaped.ends_with('"')
                || escaped.ends_with('\\');
            if multi_line {
                self.output.push_str("\"\"\"\n");
                for line in escaped.lines() {
                    if !line.is_empty() {
                        self.push_indent();
                        self.output.push_str(line);
                    }
                    self.output.push('\n');
                }
                self.push_indent();
                self.output.push_str("\"\"\"");
            } else {
                self.output.push_str("\"\"\"");
                self.output.push_str(&escaped);
                self.output.push_str("\"\"\"");
            }
        }

        self.output.push('\n');
        self.push_indent();
    }

    fn push_indent(&mut self) {
        for _ in 0..(self.indent * self.options.indent_size) {
            self.output.push(' ');
        }
    }
}

fn argument_to_string(arg: &Argument) -> String {
    let mut out = String::new();
    out.push_str(&arg.name.value);
    out.push_str(": ");
    write_value(&mut out, &arg.value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Variable(name) => {
            out.push('$');
            out.push_str(&name.value);
        }
        Value::Int(i, _) => out.push_str(&i.to_string()),
        // Debug keeps a fractional part or exponent, so the literal stays a float.
        Value::Float(f, _) => out.push_str(&format!("{f:?}")),
        Value::String(s, _) => write_string(out, s),
        Value::Boolean(b, _) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null(_) => out.push_str("null"),
        Value::Enum(name) => out.push_str(&name.value),
        Value::List(items, _) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(fields, _) => {
            out.push('{');
            for (i, (name, value)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&name.value);
                out.push_str(": ");
                write_value(out, value);
            }
            out.push('}');
        }
    }
}

/// Writes a quoted string literal with JSON-style escapes.
fn write_string(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Prints a document with default options.
#[must_use]
pub fn print(document: &Document) -> String {
    Printer::new(PrintOptions::default()).print(document)
}

/// Prints a document with custom options.
#[must_use]
pub fn print_with_options(document: &Document, options: PrintOptions) -> String {
    Printer::new(options).print(document)
}

/// Prints a single value as a GraphQL literal.
#[must_use]
pub fn print_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}
