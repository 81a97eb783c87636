//! Core error types.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the core building blocks.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("index {index} out of range for set of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("job group has no jobs")]
    EmptyJobGroup,

    #[error("job group already started")]
    AlreadyStarted,

    #[error("status decode error: {0}")]
    StatusDecode(#[from] serde_json::Error),
}
