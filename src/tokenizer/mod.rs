//! Lexical analysis of expression text.
//!
//! Transforms one expression's raw text into a token stream for the parser.
//! Whitespace is preserved as tokens so callers can report exact positions;
//! [`significant_tokens`] strips it before parsing.
//!
//! * [`token`]: token types, tokenizer loop and errors
//! * [`literal`]: number and string literal parsing
//! * [`symbol`]: operator and delimiter parsing

pub mod literal;
pub mod symbol;
pub mod token;

pub use literal::Literal;
pub use symbol::{Delimiter, Operator};
pub use token::{significant_tokens, Token, TokenSpan, Tokenizer, TokenizerError};
