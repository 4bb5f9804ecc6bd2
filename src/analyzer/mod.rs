//! Syntactic analysis.
//!
//! Two layers: [`program`] splits raw text into variable declarations and the
//! final expression, while [`expression`] parses one expression's token
//! stream into an AST using the combinator system in [`core`] and
//! [`combinators`].

pub mod combinators;
pub mod core;
pub mod expression;
pub mod program;

pub use self::core::{ParseError, ParseResult, Parser};
pub use expression::parse_tokens;
pub use program::{ExpressionProgram, ProgramError, VariableDeclaration};
