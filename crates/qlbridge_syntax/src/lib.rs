//! Syntax layer for qlbridge.
//!
//! This crate provides:
//! - `token`: Token kinds and token structures
//! - `lexer`: Tokenization and string literal decoding
//! - `ast`: Owned abstract syntax tree types
//! - `parser`: Recursive descent parser
//! - `printer`: Printing documents back to source
//! - `transform`: Document rewrites such as `__typename` insertion

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;
pub mod transform;

pub use ast::*;
pub use lexer::{tokenize, Lexer};
pub use parser::{parse, parse_document, ParseResult, Parser, SyntaxError};
pub use printer::{print, print_value, print_with_options, PrintOptions, Printer};
pub use token::{Token, TokenKind};
pub use transform::{add_typename, TYPENAME_FIELD};
