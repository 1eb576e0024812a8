//! Error types for hlwatch-core.

use thiserror::Error;

/// Core error types.
///
/// All variants are user-facing validation failures and are reported back
/// to the requesting chat rather than escalated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Label \"{0}\" already exists")]
    DuplicateLabel(String),

    #[error("Label \"{0}\" not found")]
    LabelNotFound(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
