//! Chain query and broadcast trait.

use crate::ChainError;
use async_trait::async_trait;
use mintline_types::{TxId, TxStatusReport};

/// Transaction status queries and raw broadcast against one chain.
///
/// One implementation per configured chain; the engine holds one client for
/// the commit/reveal chain and one for the submit/confirm chain and never
/// branches on which is which.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Query the status of a transaction by id.
    ///
    /// An unknown transaction is reported as `found: false`, not as an
    /// error; errors are reserved for transport-level failures.
    async fn transaction_status(&self, txid: &TxId) -> Result<TxStatusReport, ChainError>;

    /// Broadcast a raw signed transaction, returning its id.
    async fn broadcast(&self, raw_tx: &[u8]) -> Result<TxId, ChainError>;
}
