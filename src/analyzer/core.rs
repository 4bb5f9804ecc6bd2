//! Core parser interface and error types.
//!
//! Foundation of the combinator system that turns a token stream into an
//! expression AST.

use thiserror::Error;

/// A parser over a token slice.
///
/// Takes the input and a position, returning either the new position with the
/// parsed value or a [`ParseError`].
pub trait Parser<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

pub type ParseResult<O> = Result<(usize, O), ParseError>;

/// Parsing failure with position and accumulated context labels.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected end of expression at position {position}, context: {context:?}")]
    UnexpectedEof {
        position: usize,
        context: Option<String>,
    },
    #[error("Expected {expected}, found {found} at position {position}, context: {context:?}")]
    Unexpected {
        expected: String,
        found: String,
        position: usize,
        context: Option<String>,
    },
    #[error("No alternative matched at position {position}, context: {context:?}")]
    NoAlternative {
        position: usize,
        context: Option<String>,
    },
}

impl ParseError {
    pub fn unexpected_eof(position: usize) -> Self {
        ParseError::UnexpectedEof {
            position,
            context: None,
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>, position: usize) -> Self {
        ParseError::Unexpected {
            expected: expected.into(),
            found: found.into(),
            position,
            context: None,
        }
    }

    /// Appends a context label, building a trail as the error bubbles up.
    pub fn with_context(self, ctx: &str) -> Self {
        let extend = |context: Option<String>| {
            Some(match context {
                Some(c) => format!("{} -> {}", c, ctx),
                None => ctx.to_string(),
            })
        };
        match self {
            ParseError::UnexpectedEof { position, context } => ParseError::UnexpectedEof {
                position,
                context: extend(context),
            },
            ParseError::Unexpected {
                expected,
                found,
                position,
                context,
            } => ParseError::Unexpected {
                expected,
                found,
                position,
                context: extend(context),
            },
            ParseError::NoAlternative { position, context } => ParseError::NoAlternative {
                position,
                context: extend(context),
            },
        }
    }

    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedEof { position, .. } => *position,
            ParseError::Unexpected { position, .. } => *position,
            ParseError::NoAlternative { position, .. } => *position,
        }
    }
}
