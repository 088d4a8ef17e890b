//! Error type for storage operations.

use thiserror::Error;

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored row could not be encoded or decoded.
    #[error("storage codec error: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}
