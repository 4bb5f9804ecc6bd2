//! Expression evaluation.
//!
//! [`Value`] is the type expressions compute with; [`evaluator::Evaluator`]
//! walks the AST, resolving identifiers through the builtin function library
//! and the injected data source. Everything that can go wrong during
//! evaluation — arity violations, unresolvable columns, syntax errors inside
//! one expression line — flows back through [`EvalError`] as a result value;
//! only the structural program errors of
//! [`crate::analyzer::ProgramError`] are raised before evaluation begins.

pub mod evaluator;

use std::fmt;

use thiserror::Error;

use crate::analyzer::ParseError;
use crate::functions::chem::ChemError;
use crate::model::PointValueSet;
use crate::source::SourceError;
use crate::tokenizer::TokenizerError;

pub use evaluator::Evaluator;

/// Result of evaluating an expression: a per-point map, a scalar, or a bare
/// string (string literals are values so they can be function arguments).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Text(String),
    Map(PointValueSet),
}

impl Value {
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Map(_) => write!(f, "map"),
        }
    }
}

/// Errors delivered through the evaluation-result channel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// Arity/kind violation; carries the full templated message.
    #[error("{0}")]
    FunctionArguments(String),

    #[error("Unknown identifier: \"{0}\"")]
    UnknownIdentifier(String),

    #[error("Unknown function: \"{0}\"")]
    UnknownFunction(String),

    #[error("Line {line}: {source}")]
    Tokenize {
        line: usize,
        #[source]
        source: TokenizerError,
    },

    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Chem(#[from] ChemError),

    #[error("Cannot apply operator '{op}' to {left} and {right}")]
    InvalidOperands {
        op: String,
        left: String,
        right: String,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Expression did not result in usable map data. Result was: {0}")]
    NotMapData(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Extracts the map from a result, for callers that need a point-indexed
/// table rather than a scalar.
pub fn require_map(value: Value) -> EvalResult<PointValueSet> {
    match value {
        Value::Map(set) => Ok(set),
        other => Err(EvalError::NotMapData(other.to_string())),
    }
}
