//! Content-encoding service interface (commit/reveal model only).

use crate::ChainError;
use async_trait::async_trait;
use mintline_types::{CommitOutput, ContentId, ContentRef, TxId};

/// Inputs for constructing a reveal transaction.
#[derive(Debug, Clone)]
pub struct RevealRequest {
    /// The confirmed commit transaction.
    pub commit_txid: TxId,
    /// The commit output the reveal spends.
    pub output: CommitOutput,
    /// Content to inscribe.
    pub content: ContentRef,
    /// Hex public key of the ephemeral pair generated for this mint.
    pub reveal_pubkey: String,
}

/// A constructed, broadcast-ready reveal transaction.
#[derive(Debug, Clone)]
pub struct RevealTemplate {
    /// Raw transaction bytes.
    pub raw_tx: Vec<u8>,
    /// The content id the inscription will carry.
    pub content_id: ContentId,
}

/// Chain-specific script construction, consumed as a library.
///
/// Reveal construction is deterministic in its inputs: re-invoking with the
/// same request yields an equivalent template, which is what makes the
/// crash-resume path in `submit_reveal` safe.
#[async_trait]
pub trait ContentEncoder: Send + Sync {
    /// Locate the designated output of a commit transaction.
    async fn inspect_commit(&self, raw_tx: &[u8]) -> Result<CommitOutput, ChainError>;

    /// Construct the reveal transaction for a confirmed commit.
    async fn build_reveal(&self, request: &RevealRequest) -> Result<RevealTemplate, ChainError>;
}
