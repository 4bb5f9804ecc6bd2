//! Program structure: variable declarations plus one final expression.
//!
//! A program is zero or more lines of `name = expression` followed by exactly
//! one line holding the expression to evaluate. Splitting happens on the raw
//! text, before tokenizing, so structural problems are reported synchronously
//! and never reach the evaluator.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Legal variable names: identifier of at most 50 characters.
    static ref VARIABLE_NAME: Regex = Regex::new("^[A-Za-z_][A-Za-z0-9_]{0,49}$").unwrap();
}

/// One `name = expression` line.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    /// Raw text to the right of the `=`.
    pub expression: String,
    /// 1-based source line the declaration appeared on.
    pub line: usize,
}

/// A split program, ready for per-expression tokenizing and parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionProgram {
    pub declarations: Vec<VariableDeclaration>,
    pub expression: String,
    pub expression_line: usize,
}

/// Structural errors: the declaration block itself is malformed.
///
/// These are raised by [`ExpressionProgram::parse`] before any evaluation
/// begins and never travel through the evaluation-result channel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProgramError {
    #[error("Line {line}: Invalid variable name definition: \"{name}\"")]
    InvalidVariableName { line: usize, name: String },

    #[error("Detected unexpected variable declaration after expression on line {line}: \"{text}\"")]
    DeclarationAfterExpression { line: usize, text: String },

    #[error("Detected unexpected content after expression on line {line}: \"{text}\"")]
    ContentAfterExpression { line: usize, text: String },

    #[error("No expression found to evaluate")]
    MissingExpression,
}

impl ExpressionProgram {
    /// Splits program text into declarations and the final expression.
    ///
    /// A line is a declaration iff it contains `=` (the grammar has no `==`);
    /// the first line that is not a declaration becomes the final expression.
    /// Blank lines are skipped throughout.
    pub fn parse(text: &str) -> Result<Self, ProgramError> {
        let mut declarations = Vec::new();
        let mut expression: Option<(String, usize)> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(equals) = line.find('=') {
                if expression.is_some() {
                    return Err(ProgramError::DeclarationAfterExpression {
                        line: line_number,
                        text: line.to_string(),
                    });
                }
                let name = line[..equals].trim();
                if !VARIABLE_NAME.is_match(name) {
                    return Err(ProgramError::InvalidVariableName {
                        line: line_number,
                        name: name.to_string(),
                    });
                }
                declarations.push(VariableDeclaration {
                    name: name.to_string(),
                    expression: line[equals + 1..].trim().to_string(),
                    line: line_number,
                });
            } else if expression.is_some() {
                return Err(ProgramError::ContentAfterExpression {
                    line: line_number,
                    text: line.to_string(),
                });
            } else {
                expression = Some((line.to_string(), line_number));
            }
        }

        let (expression, expression_line) =
            expression.ok_or(ProgramError::MissingExpression)?;

        Ok(Self {
            declarations,
            expression,
            expression_line,
        })
    }
}
