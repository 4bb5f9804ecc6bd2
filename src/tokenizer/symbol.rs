//! Operator and delimiter parsing.

use nom::{branch::alt, character::complete::char, combinator::map, error::context};

use super::token::{ParserResult, Token};

/// Arithmetic operators of the map algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Asterisk,
    Slash,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Asterisk => "*",
            Operator::Slash => "/",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    OpenParen,
    CloseParen,
    Comma,
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Delimiter::OpenParen => "(",
            Delimiter::CloseParen => ")",
            Delimiter::Comma => ",",
        };
        write!(f, "{}", symbol)
    }
}

pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                map(char('+'), |_| Operator::Plus),
                map(char('-'), |_| Operator::Minus),
                map(char('*'), |_| Operator::Asterisk),
                map(char('/'), |_| Operator::Slash),
            )),
            Token::Operator,
        ),
    )(input)
}

pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                map(char('('), |_| Delimiter::OpenParen),
                map(char(')'), |_| Delimiter::CloseParen),
                map(char(','), |_| Delimiter::Comma),
            )),
            Token::Delimiter,
        ),
    )(input)
}
