//! Error type for chain interactions.

use thiserror::Error;

/// Errors from chain RPC, broadcast, or content encoding.
///
/// `Rpc`, `Timeout`, and `RateLimited` are transient: the poller retries
/// them on its next interval and they are never surfaced as terminal
/// failures on a single miss. `Rejected` and `Encoding` are terminal for
/// the attempt that triggered them.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The RPC endpoint returned an error or malformed payload.
    #[error("chain rpc error: {0}")]
    Rpc(String),

    /// The request timed out.
    #[error("chain rpc timeout")]
    Timeout,

    /// The endpoint rate-limited us.
    #[error("chain rpc rate limited")]
    RateLimited,

    /// The network rejected a broadcast.
    #[error("broadcast rejected: {0}")]
    Rejected(String),

    /// The content encoder could not construct a transaction.
    #[error("content encoding failed: {0}")]
    Encoding(String),
}

impl ChainError {
    /// Whether retrying the same call later can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChainError::Rpc(_) | ChainError::Timeout | ChainError::RateLimited
        )
    }
}
