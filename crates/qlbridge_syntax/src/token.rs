//! Token kinds and structures.

use qlbridge_core::Span;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a GraphQL token.
///
/// GraphQL has no reserved words: `type`, `query` and friends are lexed as
/// [`TokenKind::Name`] and recognised by the parser from context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum TokenKind {
    // Special tokens
    Eof,
    Error,

    // Lexical tokens
    Name,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    BlockStringLiteral,

    // Punctuators
    Bang,
    Dollar,
    Amp,
    LParen,
    RParen,
    Spread,
    Colon,
    Eq,
    At,
    LBracket,
    RBracket,
    LBrace,
    Pipe,
    RBrace,
}

impl TokenKind {
    #[must_use]
    pub const fn is_punctuator(self) -> bool {
        matches!(
            self,
            Self::Bang
                | Self::Dollar
                | Self::Amp
                | Self::LParen
                | Self::RParen
                | Self::Spread
                | Self::Colon
                | Self::Eq
                | Self::At
                | Self::LBracket
                | Self::RBracket
                | Self::LBrace
                | Self::Pipe
                | Self::RBrace
        )
    }

    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self, Self::StringLiteral | Self::BlockStringLiteral)
    }

    /// Returns a human readable description used in diagnostics.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Eof => "end of input",
            Self::Error => "invalid token",
            Self::Name => "name",
            Self::IntLiteral => "integer",
            Self::FloatLiteral => "float",
            Self::StringLiteral => "string",
            Self::BlockStringLiteral => "block string",
            Self::Bang => "`!`",
            Self::Dollar => "`$`",
            Self::Amp => "`&`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::Spread => "`...`",
            Self::Colon => "`:`",
            Self::Eq => "`=`",
            Self::At => "`@`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::LBrace => "`{`",
            Self::Pipe => "`|`",
            Self::RBrace => "`}`",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token with its kind and span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    #[must_use]
    pub const fn is(&self, kind: TokenKind) -> bool {
        self.kind as u8 == kind as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuator_classification() {
        assert!(TokenKind::Spread.is_punctuator());
        assert!(!TokenKind::Name.is_punctuator());
        assert!(TokenKind::BlockStringLiteral.is_string());
    }

    #[test]
    fn test_token_is() {
        let token = Token::new(TokenKind::LBrace, Span::new(0, 1));
        assert!(token.is(TokenKind::LBrace));
        assert!(!token.is(TokenKind::RBrace));
        assert_eq!(token.kind.to_string(), "`{`");
    }
}
