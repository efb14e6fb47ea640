//! Error types for core editor operations.

use thiserror::Error;

/// Result type for core editor operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core editor operations.
///
/// Missing layers and objects are deliberately *not* represented here:
/// operations referencing an absent identifier are silent no-ops, because
/// concurrent UI actions routinely race with deletions.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation was attempted that the current state does not allow.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Snapshot serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
