//! The expression evaluator.
//!
//! Walks an [`Expression`] tree, resolving function calls through the builtin
//! library (which pulls from the injected [`ScanDataSource`]) and arithmetic
//! through the point-set algebra. Declarations are evaluated in order before
//! the final expression; within one evaluation everything resolves strictly
//! left to right. Once started, an evaluation runs to completion or failure —
//! there is no cancellable state.

use std::collections::HashMap;

use async_recursion::async_recursion;
use tracing::debug;

use crate::analyzer::{parse_tokens, ExpressionProgram};
use crate::ast::{BinaryOperator, Expression, Literal, UnaryOperator};
use crate::error::Error;
use crate::functions;
use crate::model::Operand;
use crate::source::ScanDataSource;
use crate::tokenizer::{significant_tokens, Tokenizer};

use super::{EvalError, EvalResult, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Parses and evaluates a full program.
    ///
    /// Structural errors in the declaration block surface as
    /// [`Error::Program`] before any evaluation work begins; everything else
    /// comes back as [`Error::Eval`].
    pub async fn evaluate(
        &self,
        text: &str,
        source: &dyn ScanDataSource,
    ) -> Result<Value, Error> {
        let program = ExpressionProgram::parse(text)?;
        Ok(self.evaluate_program(&program, source).await?)
    }

    /// Evaluates an already-split program.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn evaluate_program(
        &self,
        program: &ExpressionProgram,
        source: &dyn ScanDataSource,
    ) -> EvalResult<Value> {
        let mut scope: HashMap<String, Value> = HashMap::new();

        for declaration in &program.declarations {
            let expr = Self::parse_line(&declaration.expression, declaration.line)?;
            let value = self.eval_expression(&expr, &scope, source).await?;
            debug!(variable = %declaration.name, "bound declaration");
            scope.insert(declaration.name.clone(), value);
        }

        let expr = Self::parse_line(&program.expression, program.expression_line)?;
        self.eval_expression(&expr, &scope, source).await
    }

    /// Tokenizes and parses one expression line, tagging failures with its
    /// source line number.
    fn parse_line(text: &str, line: usize) -> EvalResult<Expression> {
        let spans = Tokenizer::new()
            .tokenize(text)
            .map_err(|source| EvalError::Tokenize { line, source })?;
        let tokens = significant_tokens(spans);
        parse_tokens(&tokens).map_err(|source| EvalError::Parse { line, source })
    }

    #[async_recursion]
    async fn eval_expression(
        &self,
        expr: &Expression,
        scope: &HashMap<String, Value>,
        source: &dyn ScanDataSource,
    ) -> EvalResult<Value> {
        match expr {
            Expression::Literal(literal) => Ok(Self::eval_literal(literal)),
            Expression::Variable(name) => scope
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
            Expression::FunctionCall {
                function,
                arguments,
            } => {
                // Arguments resolve in declaration order, one at a time
                let mut evaluated = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    evaluated.push(self.eval_expression(argument, scope, source).await?);
                }
                functions::call_function(function, &evaluated, source).await
            }
            Expression::BinaryOp { op, left, right } => {
                let left = self.eval_expression(left, scope, source).await?;
                let right = self.eval_expression(right, scope, source).await?;
                Self::apply_binary(*op, left, right)
            }
            Expression::UnaryOp { op, expr } => {
                let value = self.eval_expression(expr, scope, source).await?;
                Self::apply_unary(*op, value)
            }
        }
    }

    fn eval_literal(literal: &Literal) -> Value {
        match literal {
            Literal::Number(n) => Value::Scalar(*n),
            Literal::String(s) => Value::Text(s.clone()),
        }
    }

    fn apply_unary(op: UnaryOperator, value: Value) -> EvalResult<Value> {
        let UnaryOperator::Negate = op;
        match value {
            Value::Scalar(n) => Ok(Value::Scalar(-n)),
            Value::Map(set) => Ok(Value::Map(set.map_values(|v| -v))),
            Value::Text(s) => Err(EvalError::InvalidOperands {
                op: "-".to_string(),
                left: format!("\"{}\"", s),
                right: String::new(),
            }),
        }
    }

    fn apply_binary(op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
        let f: fn(f64, f64) -> f64 = match op {
            BinaryOperator::Add => |l, r| l + r,
            BinaryOperator::Subtract => |l, r| l - r,
            BinaryOperator::Multiply => |l, r| l * r,
            BinaryOperator::Divide => |l, r| l / r,
        };

        match (left, right) {
            (Value::Scalar(l), Value::Scalar(r)) => {
                if op == BinaryOperator::Divide && r == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Scalar(f(l, r)))
            }
            (Value::Map(l), Value::Scalar(r)) => Ok(Value::Map(l.combine(&Operand::Scalar(r), f))),
            // Scalar-on-the-left keeps operand order: each right entry becomes f(scalar, v)
            (Value::Scalar(l), Value::Map(r)) => Ok(Value::Map(r.map_values(|v| f(l, v)))),
            (Value::Map(l), Value::Map(r)) => Ok(Value::Map(l.combine(&Operand::Set(&r), f))),
            (left, right) => Err(EvalError::InvalidOperands {
                op: op.to_string(),
                left: left.to_string(),
                right: right.to_string(),
            }),
        }
    }
}
