use std::path::PathBuf;
use thiserror::Error;

pub type FboxResult<T> = Result<T, FboxError>;

/// Error taxonomy shared by all fbox crates.
///
/// `InvalidInput` and `NotFound` are raised by validation before any output
/// is written; `Io` can surface mid-operation, in which case files already
/// written stay on disk (no rollback).
#[derive(Debug, Error)]
pub enum FboxError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
