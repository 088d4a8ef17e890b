//! Chain-facing value types shared by both transaction models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which transaction model a collection mints on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainModel {
    /// Two on-chain transactions: a commit that locks the content hash,
    /// then a reveal that inscribes it.
    CommitReveal,
    /// One on-chain transaction, polled from broadcast to finality.
    SubmitConfirm,
}

impl fmt::Display for ChainModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainModel::CommitReveal => f.write_str("commit-reveal"),
            ChainModel::SubmitConfirm => f.write_str("submit-confirm"),
        }
    }
}

/// What a chain query reported about one transaction.
///
/// Shape mirrors the indexer contract: found / confirmed / finalized flags,
/// the execution error if the transaction was included but failed, and the
/// inclusion height when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatusReport {
    /// Whether the transaction is known to the network at all.
    pub found: bool,
    /// Whether it has at least one confirmation.
    pub confirmed: bool,
    /// Whether it has reached finality for its chain.
    pub finalized: bool,
    /// Execution error reported by the chain, if any.
    pub error: Option<String>,
    /// Inclusion block height, when confirmed.
    pub block_height: Option<u64>,
    /// Confirmation depth, zero while pending.
    pub confirmations: u64,
}

impl TxStatusReport {
    /// The network does not know this transaction.
    pub fn not_found() -> Self {
        Self {
            found: false,
            confirmed: false,
            finalized: false,
            error: None,
            block_height: None,
            confirmations: 0,
        }
    }

    /// Known but not yet confirmed (in the mempool).
    pub fn pending() -> Self {
        Self {
            found: true,
            confirmed: false,
            finalized: false,
            error: None,
            block_height: None,
            confirmations: 0,
        }
    }

    /// Confirmed to the given depth but not yet final.
    pub fn confirmed(confirmations: u64, block_height: u64) -> Self {
        Self {
            found: true,
            confirmed: true,
            finalized: false,
            error: None,
            block_height: Some(block_height),
            confirmations,
        }
    }

    /// Finalized without an execution error.
    pub fn finalized(confirmations: u64, block_height: u64) -> Self {
        Self {
            found: true,
            confirmed: true,
            finalized: true,
            error: None,
            block_height: Some(block_height),
            confirmations,
        }
    }

    /// Included on-chain but the execution errored.
    pub fn errored(message: impl Into<String>, block_height: u64) -> Self {
        Self {
            found: true,
            confirmed: true,
            finalized: true,
            error: Some(message.into()),
            block_height: Some(block_height),
            confirmations: 1,
        }
    }

    /// Finalized and error-free: safe to treat the mint as settled.
    pub fn is_settled(&self) -> bool {
        self.found && self.finalized && self.error.is_none()
    }

    /// Included but the execution failed.
    pub fn is_execution_failure(&self) -> bool {
        self.found && self.error.is_some()
    }
}
