//! Token types and the tokenizer loop.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    combinator::{map, recognize},
    error::VerboseError,
    sequence::pair,
    IResult,
};
use thiserror::Error;

use super::{
    literal::{parse_literal, Literal},
    symbol::{parse_delimiter, parse_operator, Delimiter, Operator},
};

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// One lexical element of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    Literal(Literal),
    Operator(Operator),
    Delimiter(Delimiter),
    Whitespace(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Literal(literal) => write!(f, "{}", literal),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Delimiter(d) => write!(f, "{}", d),
            Token::Whitespace(_) => write!(f, " "),
        }
    }
}

/// A token plus its byte offsets in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenizerError {
    #[error("Unrecognised input at position {position}: \"{found}\"")]
    UnrecognisedInput { found: String, position: usize },
}

fn parse_identifier(input: &str) -> ParserResult<Token> {
    map(
        recognize(pair(
            take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        )),
        |name: &str| Token::Identifier(name.to_string()),
    )(input)
}

fn parse_whitespace(input: &str) -> ParserResult<Token> {
    map(
        take_while1(|c: char| c == ' ' || c == '\t'),
        |ws: &str| Token::Whitespace(ws.to_string()),
    )(input)
}

/// Tokenizer for a single expression's text.
///
/// Expressions are single lines by the time they reach the tokenizer (the
/// program splitter handles line structure), so only byte offsets are
/// tracked.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    current_position: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize(&mut self, input: &str) -> Result<Vec<TokenSpan>, TokenizerError> {
        let mut tokens = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            let start = self.current_position;

            let result = alt((
                parse_whitespace,
                parse_literal,
                parse_operator,
                parse_delimiter,
                parse_identifier,
            ))(remaining);

            match result {
                Ok((new_remaining, token)) => {
                    let consumed = remaining.len() - new_remaining.len();
                    self.current_position += consumed;
                    tokens.push(TokenSpan {
                        token,
                        start,
                        end: self.current_position,
                    });
                    remaining = new_remaining;
                }
                Err(_) => {
                    let found = remaining.chars().take(20).collect::<String>();
                    return Err(TokenizerError::UnrecognisedInput {
                        found,
                        position: self.current_position,
                    });
                }
            }
        }

        Ok(tokens)
    }
}

/// Drops formatting tokens, leaving the stream the parser consumes.
pub fn significant_tokens(spans: Vec<TokenSpan>) -> Vec<Token> {
    spans
        .into_iter()
        .filter(|span| !matches!(span.token, Token::Whitespace(_)))
        .map(|span| span.token)
        .collect()
}
