//! Recursive descent parser for GraphQL documents.
//!
//! Handles both executable definitions (operations, fragments) and type
//! system definitions (SDL). Keywords are names, so dispatch happens on the
//! text of the current token.

use crate::ast::*;
use crate::lexer::{block_string_value, string_value, Lexer};
use crate::token::{Token, TokenKind};
use qlbridge_core::{diagnostics::codes, DiagnosticBag, LineIndex, Location, Span};
use thiserror::Error;

/// Marker for an abandoned definition. The diagnostic is already recorded.
struct Abort;

type PResult<T> = Result<T, Abort>;

/// A document that failed to parse.
#[derive(Debug, Clone, Error)]
#[error("Syntax Error: {message}")]
pub struct SyntaxError {
    /// Message of the first diagnostic.
    pub message: String,
    /// Location of the first diagnostic.
    pub locations: Vec<Location>,
    /// Every diagnostic the parser produced.
    pub diagnostics: DiagnosticBag,
}

impl SyntaxError {
    fn from_diagnostics(source: &str, diagnostics: DiagnosticBag) -> Self {
        let index = LineIndex::new(source);
        let first = diagnostics.errors().next();
        let message = first
            .and_then(|d| d.labels.first())
            .map(|l| l.message.clone())
            .or_else(|| first.map(|d| d.title.clone()))
            .unwrap_or_else(|| "invalid document".to_string());
        let locations = first
            .and_then(|d| d.primary_span())
            .map(|span| vec![index.location(span.start)])
            .unwrap_or_default();
        Self {
            message,
            locations,
            diagnostics,
        }
    }
}

/// Result of parsing.
pub struct ParseResult {
    pub document: Document,
    pub diagnostics: DiagnosticBag,
}

/// Parses a source string, keeping whatever definitions parsed cleanly.
#[must_use]
pub fn parse(source: &str) -> ParseResult {
    let mut parser = Parser::new(source);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

/// Parses a source string, failing on the first syntax error.
pub fn parse_document(source: &str) -> Result<Document, SyntaxError> {
    let ParseResult {
        document,
        diagnostics,
    } = parse(source);
    if diagnostics.has_errors() {
        return Err(SyntaxError::from_diagnostics(source, diagnostics));
    }
    Ok(document)
}

/// Parser for GraphQL.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    prev_end: u32,
    diagnostics: DiagnosticBag,
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            prev_end: 0,
            diagnostics: DiagnosticBag::new(),
        }
    }

    #[inline]
    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    #[inline]
    fn at_keyword(&self, keyword: &str) -> bool {
        self.at(TokenKind::Name) && self.text() == keyword
    }

    #[inline]
    fn text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    fn advance(&mut self) {
        self.prev_end = self.current.span.end;
        self.current = self.lexer.next_token();
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Span> {
        let span = self.current.span;
        if self.eat(kind) {
            Ok(span)
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> PResult<()> {
        if self.at_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{keyword}`")))
        }
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn describe_current(&self) -> String {
        match self.current.kind {
            TokenKind::Name | TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::Error => {
                format!("`{}`", self.text())
            }
            kind => kind.describe().to_string(),
        }
    }

    /// Records an error at the current token.
    fn unexpected(&mut self, expected: &str) -> Abort {
        let (code, title) = match self.current.kind {
            TokenKind::Eof => (codes::UNEXPECTED_EOF, "unexpected end of input"),
            TokenKind::Error if self.text().starts_with('"') => {
                (codes::UNTERMINATED_STRING, "unterminated string")
            }
            TokenKind::Error => (codes::INVALID_SYNTAX, "invalid token"),
            _ => (codes::UNEXPECTED_TOKEN, "unexpected token"),
        };
        let message = format!("expected {expected}, found {}", self.describe_current());
        self.diagnostics.error(code, title, self.current.span, message);
        Abort
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        while !self.at(TokenKind::Eof) {
            match self.parse_definition() {
                Ok(def) => definitions.push(def),
                Err(Abort) => self.synchronize(),
            }
        }

        if definitions.is_empty() && !self.diagnostics.has_errors() {
            self.unexpected("definition");
        }

        Document {
            definitions,
            span: Span::new(start, self.current.span.end),
        }
    }

    /// Skips to the next token that can start a definition.
    fn synchronize(&mut self) {
        if self.at(TokenKind::Eof) {
            return;
        }
        self.advance();
        while !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Name)
                && matches!(
                    self.text(),
                    "schema"
                        | "scalar"
                        | "type"
                        | "interface"
                        | "union"
                        | "enum"
                        | "input"
                        | "directive"
                        | "extend"
                        | "query"
                        | "mutation"
                        | "subscription"
                        | "fragment"
                )
            {
                return;
            }
            self.advance();
        }
    }

    fn parse_definition(&mut self) -> PResult<Definition> {
        if self.at(TokenKind::LBrace) {
            return Ok(Definition::Operation(self.parse_operation()?));
        }

        let description = self.parse_description()?;
        let start = description
            .as_ref()
            .map_or(self.current.span.start, |d| d.span.start);

        if !self.at(TokenKind::Name) {
            return Err(self.unexpected("definition"));
        }

        match (self.text(), description.is_some()) {
            ("schema", _) => Ok(Definition::Schema(
                self.parse_schema_definition(start, description, false)?,
            )),
            ("scalar" | "type" | "interface" | "union" | "enum" | "input", _) => Ok(
                Definition::Type(self.parse_type_definition(start, description)?),
            ),
            ("directive", _) => Ok(Definition::Directive(
                self.parse_directive_definition(start, description)?,
            )),
            ("extend", false) => self.parse_extension(),
            ("query" | "mutation" | "subscription", false) => {
                Ok(Definition::Operation(self.parse_operation()?))
            }
            ("fragment", false) => Ok(Definition::Fragment(self.parse_fragment_definition()?)),
            (_, true) => Err(self.unexpected("type system definition")),
            (_, false) => Err(self.unexpected("definition")),
        }
    }

    fn parse_name(&mut self) -> PResult<Name> {
        let span = self.current.span;
        if !self.at(TokenKind::Name) {
            return Err(self.unexpected("name"));
        }
        let value = self.text();
        self.advance();
        Ok(Name::new(value, span))
    }

    /// Decodes the current string token.
    fn parse_string(&mut self) -> PResult<(String, bool, Span)> {
        let span = self.current.span;
        let raw = self.text();
        let decoded = match self.current.kind {
            TokenKind::StringLiteral => match string_value(raw) {
                Ok(value) => (value, false, span),
                Err(err) => {
                    self.diagnostics
                        .error(codes::INVALID_ESCAPE, "invalid string", span, err.to_string());
                    return Err(Abort);
                }
            },
            TokenKind::BlockStringLiteral => (block_string_value(raw), true, span),
            _ => return Err(self.unexpected("string")),
        };
        self.advance();
        Ok(decoded)
    }

    fn parse_description(&mut self) -> PResult<Option<Description>> {
        if !self.current.kind.is_string() {
            return Ok(None);
        }
        let (value, block, span) = self.parse_string()?;
        Ok(Some(Description::new(value, block, span)))
    }

    /// Parses `open item+ close`.
    fn many<T>(
        &mut self,
        open: TokenKind,
        close: TokenKind,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            items.push(item(self)?);
            if self.eat(close) {
                return Ok(items);
            }
        }
    }

    /// Parses `(open item+ close)?`.
    fn optional_many<T>(
        &mut self,
        open: TokenKind,
        close: TokenKind,
        item: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        if self.at(open) {
            self.many(open, close, item)
        } else {
            Ok(Vec::new())
        }
    }

    // =========================================================================
    // Executable definitions
    // =========================================================================

    fn parse_operation(&mut self) -> PResult<OperationDefinition> {
        let start = self.current.span.start;

        if self.at(TokenKind::LBrace) {
            let selection_set = self.parse_selection_set()?;
            return Ok(OperationDefinition {
                operation: OperationType::Query,
                name: None,
                variables: Vec::new(),
                directives: Vec::new(),
                selection_set,
                span: self.span_from(start),
            });
        }

        let Some(operation) = OperationType::parse(self.text()) else {
            return Err(self.unexpected("operation type"));
        };
        self.advance();

        let name = if self.at(TokenKind::Name) {
            Some(self.parse_name()?)
        } else {
            None
        };
        let variables =
            self.optional_many(TokenKind::LParen, TokenKind::RParen, Self::parse_variable_definition)?;
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;

        Ok(OperationDefinition {
            operation,
            name,
            variables,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_variable_definition(&mut self) -> PResult<VariableDefinition> {
        let start = self.expect(TokenKind::Dollar)?.start;
        let name = self.parse_name()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let default_value = if self.eat(TokenKind::Eq) {
            Some(self.parse_value(true)?)
        } else {
            None
        };
        let directives = self.parse_directives(true)?;
        Ok(VariableDefinition {
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_selection_set(&mut self) -> PResult<SelectionSet> {
        let start = self.current.span.start;
        let selections = self.many(TokenKind::LBrace, TokenKind::RBrace, Self::parse_selection)?;
        Ok(SelectionSet {
            selections,
            span: self.span_from(start),
        })
    }

    fn parse_selection(&mut self) -> PResult<Selection> {
        if !self.at(TokenKind::Spread) {
            return Ok(Selection::Field(self.parse_field()?));
        }

        let start = self.current.span.start;
        self.advance(); // ...

        let has_condition = self.at_keyword("on");
        if !has_condition && self.at(TokenKind::Name) {
            let name = self.parse_name()?;
            let directives = self.parse_directives(false)?;
            return Ok(Selection::FragmentSpread(FragmentSpread {
                name,
                directives,
                span: self.span_from(start),
            }));
        }

        let type_condition = if has_condition {
            self.advance();
            Some(self.parse_name()?)
        } else {
            None
        };
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;
        Ok(Selection::InlineFragment(InlineFragment {
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        }))
    }

    fn parse_field(&mut self) -> PResult<Field> {
        let start = self.current.span.start;
        let first = self.parse_name()?;
        let (alias, name) = if self.eat(TokenKind::Colon) {
            (Some(first), self.parse_name()?)
        } else {
            (None, first)
        };
        let arguments = self.optional_many(TokenKind::LParen, TokenKind::RParen, |p| {
            p.parse_argument(false)
        })?;
        let directives = self.parse_directives(false)?;
        let selection_set = if self.at(TokenKind::LBrace) {
            Some(self.parse_selection_set()?)
        } else {
            None
        };
        Ok(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_argument(&mut self, is_const: bool) -> PResult<Argument> {
        let start = self.current.span.start;
        let name = self.parse_name()?;
        self.expect(TokenKind::Colon)?;
        let value = self.parse_value(is_const)?;
        Ok(Argument {
            name,
            value,
            span: self.span_from(start),
        })
    }

    fn parse_fragment_definition(&mut self) -> PResult<FragmentDefinition> {
        let start = self.current.span.start;
        self.advance(); // fragment

        if self.at_keyword("on") {
            return Err(self.unexpected("fragment name"));
        }
        let name = self.parse_name()?;
        self.expect_keyword("on")?;
        let type_condition = self.parse_name()?;
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;
        Ok(FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_directives(&mut self, is_const: bool) -> PResult<Vec<Directive>> {
        let mut directives = Vec::new();
        while self.at(TokenKind::At) {
            let start = self.current.span.start;
            self.advance();
            let name = self.parse_name()?;
            let arguments = self.optional_many(TokenKind::LParen, TokenKind::RParen, |p| {
                p.parse_argument(is_const)
            })?;
            directives.push(Directive {
                name,
                arguments,
                span: self.span_from(start),
            });
        }
        Ok(directives)
    }

    // =========================================================================
    // Values and types
    // =========================================================================

    fn parse_value(&mut self, is_const: bool) -> PResult<Value> {
        let span = self.current.span;
        match self.current.kind {
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.eat(TokenKind::RBracket) {
                    items.push(self.parse_value(is_const)?);
                }
                Ok(Value::List(items, self.span_from(span.start)))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !self.eat(TokenKind::RBrace) {
                    let name = self.parse_name()?;
                    self.expect(TokenKind::Colon)?;
                    fields.push((name, self.parse_value(is_const)?));
                }
                Ok(Value::Object(fields, self.span_from(span.start)))
            }
            TokenKind::Dollar if !is_const => {
                self.advance();
                let name = self.parse_name()?;
                Ok(Value::Variable(Name::new(
                    name.value,
                    Span::new(span.start, name.span.end),
                )))
            }
            TokenKind::IntLiteral => {
                let text = self.text();
                let Ok(value) = text.parse::<i64>() else {
                    self.diagnostics.error(
                        codes::INVALID_SYNTAX,
                        "invalid integer",
                        span,
                        format!("integer `{text}` is out of range"),
                    );
                    return Err(Abort);
                };
                self.advance();
                Ok(Value::Int(value, span))
            }
            TokenKind::FloatLiteral => {
                let Ok(value) = self.text().parse::<f64>() else {
                    return Err(self.unexpected("float"));
                };
                self.advance();
                Ok(Value::Float(value, span))
            }
            TokenKind::StringLiteral | TokenKind::BlockStringLiteral => {
                let (value, _, span) = self.parse_string()?;
                Ok(Value::String(value, span))
            }
            TokenKind::Name => {
                let value = match self.text() {
                    "true" => Value::Boolean(true, span),
                    "false" => Value::Boolean(false, span),
                    "null" => Value::Null(span),
                    text => Value::Enum(Name::new(text, span)),
                };
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected(if is_const { "constant value" } else { "value" })),
        }
    }

    fn parse_type(&mut self) -> PResult<Type> {
        let start = self.current.span.start;
        let ty = if self.eat(TokenKind::LBracket) {
            let inner = self.parse_type()?;
            self.expect(TokenKind::RBracket)?;
            Type::List(Box::new(inner), self.span_from(start))
        } else {
            let name = self.parse_name()?;
            Type::Named(NamedType {
                name: name.value,
                span: name.span,
            })
        };

        if self.eat(TokenKind::Bang) {
            Ok(Type::NonNull(Box::new(ty), self.span_from(start)))
        } else {
            Ok(ty)
        }
    }

    // =========================================================================
    // Type system definitions
    // =========================================================================

    fn parse_schema_definition(
        &mut self,
        start: u32,
        description: Option<Description>,
        extension: bool,
    ) -> PResult<SchemaDefinition> {
        self.advance(); // schema
        let directives = self.parse_directives(true)?;
        let operations = if extension {
            self.optional_many(
                TokenKind::LBrace,
                TokenKind::RBrace,
                Self::parse_operation_type_definition,
            )?
        } else {
            self.many(
                TokenKind::LBrace,
                TokenKind::RBrace,
                Self::parse_operation_type_definition,
            )?
        };
        Ok(SchemaDefinition {
            description,
            directives,
            operations,
            span: self.span_from(start),
        })
    }

    fn parse_operation_type_definition(&mut self) -> PResult<OperationTypeDefinition> {
        let start = self.current.span.start;
        let operation = if self.at(TokenKind::Name) {
            OperationType::parse(self.text())
        } else {
            None
        };
        let Some(operation) = operation else {
            return Err(self.unexpected("operation type"));
        };
        self.advance();
        self.expect(TokenKind::Colon)?;
        let type_name = self.parse_name()?;
        Ok(OperationTypeDefinition {
            operation,
            type_name,
            span: self.span_from(start),
        })
    }

    fn parse_type_definition(
        &mut self,
        start: u32,
        description: Option<Description>,
    ) -> PResult<TypeDefinition> {
        let keyword = self.text();
        self.advance();
        let name = self.parse_name()?;

        let def = match keyword {
            "scalar" => {
                let directives = self.parse_directives(true)?;
                TypeDefinition::Scalar(ScalarTypeDefinition {
                    description,
                    name,
                    directives,
                    span: self.span_from(start),
                })
            }
            "type" => {
                let implements = self.parse_implements()?;
                let directives = self.parse_directives(true)?;
                let fields = self.parse_fields_definition()?;
                TypeDefinition::Object(ObjectTypeDefinition {
                    description,
                    name,
                    implements,
                    directives,
                    fields,
                    span: self.span_from(start),
                })
            }
            "interface" => {
                let implements = self.parse_implements()?;
                let directives = self.parse_directives(true)?;
                let fields = self.parse_fields_definition()?;
                TypeDefinition::Interface(InterfaceTypeDefinition {
                    description,
                    name,
                    implements,
                    directives,
                    fields,
                    span: self.span_from(start),
                })
            }
            "union" => {
                let directives = self.parse_directives(true)?;
                let mut members = Vec::new();
                if self.eat(TokenKind::Eq) {
                    self.eat(TokenKind::Pipe);
                    members.push(self.parse_name()?);
                    while self.eat(TokenKind::Pipe) {
                        members.push(self.parse_name()?);
                    }
                }
                TypeDefinition::Union(UnionTypeDefinition {
                    description,
                    name,
                    directives,
                    members,
                    span: self.span_from(start),
                })
            }
            "enum" => {
                let directives = self.parse_directives(true)?;
                let values = self.optional_many(
                    TokenKind::LBrace,
                    TokenKind::RBrace,
                    Self::parse_enum_value_definition,
                )?;
                TypeDefinition::Enum(EnumTypeDefinition {
                    description,
                    name,
                    directives,
                    values,
                    span: self.span_from(start),
                })
            }
            _ => {
                let directives = self.parse_directives(true)?;
                let fields = self.optional_many(
                    TokenKind::LBrace,
                    TokenKind::RBrace,
                    Self::parse_input_value_definition,
                )?;
                TypeDefinition::InputObject(InputObjectTypeDefinition {
                    description,
                    name,
                    directives,
                    fields,
                    span: self.span_from(start),
                })
            }
        };
        Ok(def)
    }

    fn parse_implements(&mut self) -> PResult<Vec<Name>> {
        let mut interfaces = Vec::new();
        if self.at_keyword("implements") {
            self.advance();
            self.eat(TokenKind::Amp);
            interfaces.push(self.parse_name()?);
            while self.eat(TokenKind::Amp) {
                interfaces.push(self.parse_name()?);
            }
        }
        Ok(interfaces)
    }

    fn parse_fields_definition(&mut self) -> PResult<Vec<FieldDefinition>> {
        self.optional_many(
            TokenKind::LBrace,
            TokenKind::RBrace,
            Self::parse_field_definition,
        )
    }

    fn parse_field_definition(&mut self) -> PResult<FieldDefinition> {
        let start = self.current.span.start;
        let description = self.parse_description()?;
        let name = self.parse_name()?;
        let arguments = self.optional_many(
            TokenKind::LParen,
            TokenKind::RParen,
            Self::parse_input_value_definition,
        )?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let directives = self.parse_directives(true)?;
        Ok(FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_input_value_definition(&mut self) -> PResult<InputValueDefinition> {
        let start = self.current.span.start;
        let description = self.parse_description()?;
        let name = self.parse_name()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let default_value = if self.eat(TokenKind::Eq) {
            Some(self.parse_value(true)?)
        } else {
            None
        };
        let directives = self.parse_directives(true)?;
        Ok(InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_enum_value_definition(&mut self) -> PResult<EnumValueDefinition> {
        let start = self.current.span.start;
        let description = self.parse_description()?;
        if matches!(self.text(), "true" | "false" | "null") {
            return Err(self.unexpected("enum value"));
        }
        let name = self.parse_name()?;
        let directives = self.parse_directives(true)?;
        Ok(EnumValueDefinition {
            description,
            name,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_directive_definition(
        &mut self,
        start: u32,
        description: Option<Description>,
    ) -> PResult<DirectiveDefinition> {
        self.advance(); // directive
        self.expect(TokenKind::At)?;
        let name = self.parse_name()?;
        let arguments = self.optional_many(
            TokenKind::LParen,
            TokenKind::RParen,
            Self::parse_input_value_definition,
        )?;
        let repeatable = self.at_keyword("repeatable");
        if repeatable {
            self.advance();
        }
        self.expect_keyword("on")?;
        self.eat(TokenKind::Pipe);
        let mut locations = vec![self.parse_directive_location()?];
        while self.eat(TokenKind::Pipe) {
            locations.push(self.parse_directive_location()?);
        }
        Ok(DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
            span: self.span_from(start),
        })
    }

    fn parse_directive_location(&mut self) -> PResult<DirectiveLocation> {
        let location = if self.at(TokenKind::Name) {
            DirectiveLocation::parse(self.text())
        } else {
            None
        };
        match location {
            Some(location) => {
                self.advance();
                Ok(location)
            }
            None => Err(self.unexpected("directive location")),
        }
    }

    fn parse_extension(&mut self) -> PResult<Definition> {
        let start = self.current.span.start;
        self.advance(); // extend

        if !self.at(TokenKind::Name) {
            return Err(self.unexpected("type system extension"));
        }
        match self.text() {
            "schema" => Ok(Definition::SchemaExtension(
                self.parse_schema_definition(start, None, true)?,
            )),
            "scalar" | "type" | "interface" | "union" | "enum" | "input" => Ok(
                Definition::TypeExtension(self.parse_type_definition(start, None)?),
            ),
            _ => Err(self.unexpected("type system extension")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
        type Post {
          id: ID!
          title: String
          body: String
          author: User
        }

        type User {
          id: ID!
          username: String
          email: String
          posts: [Post]
        }

        type Query {
          posts: [Post]
          post(id: ID!): Post
        }

        type Mutation {
          addPost(title: String!, body: String!, userId: ID!): Post!
        }

        schema {
          query: Query
          mutation: Mutation
        }
    "#;

    fn single_operation(source: &str) -> OperationDefinition {
        let document = parse_document(source).unwrap();
        let operation = document.operations().next().cloned().unwrap();
        operation
    }

    #[test]
    fn test_parse_schema_document() {
        let document = parse_document(SCHEMA).unwrap();
        assert_eq!(document.definitions.len(), 5);
        assert!(!document.is_executable());

        let Definition::Type(TypeDefinition::Object(mutation)) = &document.definitions[3] else {
            panic!("expected object type");
        };
        assert_eq!(mutation.name.as_str(), "Mutation");
        assert_eq!(mutation.fields[0].arguments.len(), 3);
        assert_eq!(mutation.fields[0].ty.to_string(), "Post!");

        let Definition::Schema(schema) = &document.definitions[4] else {
            panic!("expected schema definition");
        };
        assert_eq!(schema.operations[1].operation, OperationType::Mutation);
        assert_eq!(schema.operations[1].type_name.as_str(), "Mutation");
    }

    #[test]
    fn test_parse_named_query() {
        let op = single_operation("query posts { posts { id author { username } } }");
        assert_eq!(op.operation, OperationType::Query);
        assert_eq!(op.name.as_ref().map(Name::as_str), Some("posts"));

        let Selection::Field(posts) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        let nested = posts.selection_set.as_ref().unwrap();
        assert_eq!(nested.selections.len(), 2);
    }

    #[test]
    fn test_parse_anonymous_query() {
        let op = single_operation("{ hello }");
        assert_eq!(op.operation, OperationType::Query);
        assert!(op.name.is_none());
    }

    #[test]
    fn test_parse_variables_and_arguments() {
        let op = single_operation(
            r#"mutation add($title: String!, $tags: [String] = ["a"]) {
                addPost(title: $title, body: "text", userId: 1) { id }
            }"#,
        );
        assert_eq!(op.variables.len(), 2);
        assert_eq!(op.variables[0].ty.to_string(), "String!");
        assert!(op.variables[1].default_value.is_some());

        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert!(matches!(field.arguments[0].value, Value::Variable(ref n) if n.value == "title"));
        assert!(matches!(field.arguments[1].value, Value::String(ref s, _) if s == "text"));
        assert!(matches!(field.arguments[2].value, Value::Int(1, _)));
    }

    #[test]
    fn test_parse_fragments_and_aliases() {
        let document = parse_document(
            r#"
            query { first: post(id: "1") { ...PostFields ... on Post @include(if: true) { body } } }
            fragment PostFields on Post { id title }
            "#,
        )
        .unwrap();

        assert_eq!(document.fragments().count(), 1);
        let op = document.operations().next().unwrap();
        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert_eq!(field.response_key(), "first");

        let inner = &field.selection_set.as_ref().unwrap().selections;
        assert!(matches!(&inner[0], Selection::FragmentSpread(s) if s.name.value == "PostFields"));
        assert!(matches!(
            &inner[1],
            Selection::InlineFragment(f) if f.type_condition.as_ref().map(Name::as_str) == Some("Post")
                && f.directives.len() == 1
        ));
    }

    #[test]
    fn test_parse_type_system_features() {
        let document = parse_document(
            r#"
            """
            Something with an id.
            """
            interface Node { id: ID! }
            union SearchResult = | Post | User
            enum Role { ADMIN "plain" EDITOR }
            input NewPost { title: String! = "untitled" }
            scalar DateTime @specifiedBy(url: "https://example.com")
            directive @auth(role: Role = ADMIN) repeatable on FIELD_DEFINITION | OBJECT
            extend type Query { node(id: ID!): Node }
            "#,
        )
        .unwrap();

        assert_eq!(document.definitions.len(), 7);
        let Definition::Type(TypeDefinition::Interface(node)) = &document.definitions[0] else {
            panic!("expected interface");
        };
        let description = node.description.as_ref().unwrap();
        assert_eq!(description.value, "Something with an id.");
        assert!(description.block);

        let Definition::Type(TypeDefinition::Union(union)) = &document.definitions[1] else {
            panic!("expected union");
        };
        assert_eq!(union.members.len(), 2);

        let Definition::Directive(directive) = &document.definitions[5] else {
            panic!("expected directive definition");
        };
        assert!(directive.repeatable);
        assert_eq!(
            directive.locations,
            vec![DirectiveLocation::FieldDefinition, DirectiveLocation::Object]
        );
        assert!(matches!(
            &document.definitions[6],
            Definition::TypeExtension(TypeDefinition::Object(_))
        ));
    }

    #[test]
    fn test_syntax_error_location() {
        let err = parse_document("type Query {\n  posts: [Post\n}").unwrap_err();
        assert_eq!(err.message, "expected `]`, found `}`");
        assert_eq!(err.locations, vec![Location { line: 3, column: 1 }]);
        assert_eq!(err.to_string(), "Syntax Error: expected `]`, found `}`");
    }

    #[test]
    fn test_empty_document_is_an_error() {
        let err = parse_document("   \n  ").unwrap_err();
        assert_eq!(err.message, "expected definition, found end of input");
    }

    #[test]
    fn test_recovery_reports_every_broken_definition() {
        let result = parse("type A { a: }\ntype B { b: String }\nquery { ... }");
        assert_eq!(result.diagnostics.error_count(), 2);
        assert_eq!(result.document.definitions.len(), 1);
    }

    #[test]
    fn test_variables_are_not_constants() {
        let err = parse_document("type Query { a(x: Int = $y): Int }").unwrap_err();
        assert_eq!(err.message, "expected constant value, found `$`");
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse_document("{ a(s: \"open) }").unwrap_err();
        assert!(err.message.starts_with("expected value"));
        assert_eq!(
            err.diagnostics.errors().next().map(|d| d.code),
            Some(codes::UNTERMINATED_STRING)
        );
    }
}
