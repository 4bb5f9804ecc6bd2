//! Expression grammar.
//!
//! Builds an [`ast::Expression`] from the token stream with the usual
//! arithmetic precedence: unary minus binds tightest, then `* /`, then `+ -`.
//! Function calls and parenthesised groups are primaries.

use crate::ast;
use crate::tokenizer::{Delimiter, Literal, Operator, Token};

use super::combinators::{
    as_unit, choice, delimited, equal, lazy, many, map, satisfy, separated_list, tuple2,
    with_context,
};
use super::core::{ParseError, Parser};

/// Parses a complete token stream into one expression.
///
/// Fails if any tokens remain after the grammar stops consuming, so trailing
/// junk is rejected rather than ignored.
pub fn parse_tokens(tokens: &[Token]) -> Result<ast::Expression, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::unexpected_eof(0));
    }
    let (pos, expression) = parse_expression().parse(tokens, 0)?;
    if pos != tokens.len() {
        return Err(ParseError::unexpected(
            "end of expression",
            tokens[pos].to_string(),
            pos,
        ));
    }
    Ok(expression)
}

pub fn parse_expression() -> impl Parser<Token, ast::Expression> {
    with_context(lazy(parse_additive), "expression")
}

fn parse_additive() -> impl Parser<Token, ast::Expression> {
    with_context(
        map(
            tuple2(
                parse_multiplicative(),
                many(tuple2(
                    choice(vec![
                        Box::new(parse_operator_add()),
                        Box::new(parse_operator_subtract()),
                    ]),
                    parse_multiplicative(),
                )),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| ast::Expression::BinaryOp {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
            },
        ),
        "additive",
    )
}

fn parse_multiplicative() -> impl Parser<Token, ast::Expression> {
    with_context(
        map(
            tuple2(
                parse_unary(),
                many(tuple2(
                    choice(vec![
                        Box::new(parse_operator_multiply()),
                        Box::new(parse_operator_divide()),
                    ]),
                    parse_unary(),
                )),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| ast::Expression::BinaryOp {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
            },
        ),
        "multiplicative",
    )
}

fn parse_unary() -> impl Parser<Token, ast::Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                tuple2(
                    as_unit(equal(Token::Operator(Operator::Minus))),
                    lazy(parse_primary),
                ),
                |(_, expr)| ast::Expression::UnaryOp {
                    op: ast::UnaryOperator::Negate,
                    expr: Box::new(expr),
                },
            )),
            Box::new(lazy(parse_primary)),
        ]),
        "unary",
    )
}

fn parse_primary() -> impl Parser<Token, ast::Expression> {
    with_context(
        choice(vec![
            Box::new(parse_function_call()),
            Box::new(map(parse_literal(), ast::Expression::Literal)),
            Box::new(map(parse_identifier(), ast::Expression::Variable)),
            Box::new(parse_group()),
        ]),
        "primary",
    )
}

fn parse_group() -> impl Parser<Token, ast::Expression> {
    with_context(
        delimited(
            as_unit(equal(Token::Delimiter(Delimiter::OpenParen))),
            lazy(parse_expression),
            as_unit(equal(Token::Delimiter(Delimiter::CloseParen))),
        ),
        "group",
    )
}

fn parse_function_call() -> impl Parser<Token, ast::Expression> {
    with_context(
        map(
            tuple2(
                parse_identifier(),
                delimited(
                    as_unit(equal(Token::Delimiter(Delimiter::OpenParen))),
                    separated_list(
                        lazy(parse_expression),
                        as_unit(equal(Token::Delimiter(Delimiter::Comma))),
                    ),
                    as_unit(equal(Token::Delimiter(Delimiter::CloseParen))),
                ),
            ),
            |(function, arguments)| ast::Expression::FunctionCall {
                function,
                arguments,
            },
        ),
        "function call",
    )
}

fn parse_identifier() -> impl Parser<Token, String> {
    satisfy("identifier", |token: &Token| match token {
        Token::Identifier(name) => Some(name.clone()),
        _ => None,
    })
}

fn parse_literal() -> impl Parser<Token, ast::Literal> {
    satisfy("literal", |token: &Token| match token {
        Token::Literal(Literal::Number(n)) => Some(ast::Literal::Number(*n)),
        Token::Literal(Literal::String(s)) => Some(ast::Literal::String(s.clone())),
        _ => None,
    })
}

fn parse_operator_add() -> impl Parser<Token, ast::BinaryOperator> {
    map(equal(Token::Operator(Operator::Plus)), |_| {
        ast::BinaryOperator::Add
    })
}

fn parse_operator_subtract() -> impl Parser<Token, ast::BinaryOperator> {
    map(equal(Token::Operator(Operator::Minus)), |_| {
        ast::BinaryOperator::Subtract
    })
}

fn parse_operator_multiply() -> impl Parser<Token, ast::BinaryOperator> {
    map(equal(Token::Operator(Operator::Asterisk)), |_| {
        ast::BinaryOperator::Multiply
    })
}

fn parse_operator_divide() -> impl Parser<Token, ast::BinaryOperator> {
    map(equal(Token::Operator(Operator::Slash)), |_| {
        ast::BinaryOperator::Divide
    })
}
