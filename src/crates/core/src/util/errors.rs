//! Unified error type for the core library.

use thiserror::Error;

/// Errors produced by the directory service and the explorer engine.
///
/// Operations exposed to the rendering layer never surface these directly;
/// they are converted into `OperationResult` values at the service boundary.
#[derive(Debug, Error)]
pub enum TreelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

pub type TreelineResult<T> = Result<T, TreelineError>;
