use thiserror::Error;

use crate::analyzer::ProgramError;
use crate::eval::EvalError;
use crate::memo::{MemoError, StoreError};
use crate::model::point_set::PointSetError;
use crate::source::SourceError;

/// Top-level error aggregating every layer of the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Structural program error, raised before evaluation begins.
    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),

    #[error("Data source error: {0}")]
    Source(#[from] SourceError),

    #[error("Memoisation error: {0}")]
    Memo(#[from] MemoError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Point set error: {0}")]
    PointSet(#[from] PointSetError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
