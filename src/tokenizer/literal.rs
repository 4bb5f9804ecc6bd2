//! Number and string literal parsing.

use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit1},
    combinator::{map, map_res, opt, recognize},
    error::context,
    sequence::{delimited, pair},
};

use super::token::{ParserResult, Token};

/// A literal value appearing in expression text.
///
/// All numbers are 64-bit floats; the map algebra has no integer type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        map(
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
            |content: &str| Literal::String(content.to_string()),
        ),
    )(input)
}

/// Unsigned number with optional fraction; sign is handled by the parser's
/// unary minus so that `1-2` tokenizes as three tokens, not two.
fn parse_number_literal(input: &str) -> ParserResult<Literal> {
    context(
        "number literal",
        map_res(
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            |s: &str| s.parse::<f64>().map(Literal::Number),
        ),
    )(input)
}

pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((parse_string_literal, parse_number_literal)),
            Token::Literal,
        ),
    )(input)
}
