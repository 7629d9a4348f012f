use crate::executor::Hook;
use thiserror::Error;

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("{hook} of '{class}' failed: {message}")]
    Lifecycle {
        class: String,
        hook: Hook,
        message: String,
    },

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runner operations
pub type TallyResult<T> = Result<T, TallyError>;
