//! Scriptable in-memory chain and encoder for tests and simulation.

use crate::{ChainClient, ChainError, ContentEncoder, RevealRequest, RevealTemplate};
use async_trait::async_trait;
use mintline_types::{Amount, CommitOutput, ContentId, TxId, TxStatusReport};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

#[derive(Default)]
struct MockChainState {
    /// Queued reports per transaction; the last report repeats once drained.
    scripts: HashMap<TxId, VecDeque<TxStatusReport>>,
    settled: HashMap<TxId, TxStatusReport>,
    broadcasts: Vec<TxId>,
    reject_next: Option<String>,
    queries: u64,
}

/// In-memory [`ChainClient`] with scriptable status sequences.
///
/// Tests script a sequence of reports per transaction id; each status query
/// consumes one report, and the final report repeats thereafter. Unknown
/// transactions report not-found, mirroring real indexer behavior during
/// propagation.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<MockChainState>,
}

impl MockChain {
    /// Create an empty mock chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sequence of reports for a transaction.
    pub fn script(&self, txid: TxId, reports: Vec<TxStatusReport>) {
        self.state.lock().scripts.insert(txid, reports.into());
    }

    /// Fix a transaction's report for every subsequent query.
    pub fn set_status(&self, txid: TxId, report: TxStatusReport) {
        self.state.lock().settled.insert(txid, report);
    }

    /// Reject the next broadcast with the given reason.
    pub fn reject_next_broadcast(&self, reason: impl Into<String>) {
        self.state.lock().reject_next = Some(reason.into());
    }

    /// The deterministic transaction id a broadcast of `raw_tx` will get.
    pub fn txid_for(raw_tx: &[u8]) -> TxId {
        TxId::from_bytes(blake3::hash(raw_tx).as_bytes())
    }

    /// All transaction ids broadcast so far, in order.
    pub fn broadcasts(&self) -> Vec<TxId> {
        self.state.lock().broadcasts.clone()
    }

    /// Number of status queries served.
    pub fn query_count(&self) -> u64 {
        self.state.lock().queries
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn transaction_status(&self, txid: &TxId) -> Result<TxStatusReport, ChainError> {
        let mut state = self.state.lock();
        state.queries += 1;
        if let Some(queue) = state.scripts.get_mut(txid) {
            if let Some(report) = queue.pop_front() {
                if queue.is_empty() {
                    state.settled.insert(txid.clone(), report.clone());
                    state.scripts.remove(txid);
                }
                return Ok(report);
            }
        }
        Ok(state
            .settled
            .get(txid)
            .cloned()
            .unwrap_or_else(TxStatusReport::not_found))
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<TxId, ChainError> {
        let mut state = self.state.lock();
        if let Some(reason) = state.reject_next.take() {
            return Err(ChainError::Rejected(reason));
        }
        let txid = Self::txid_for(raw_tx);
        state.broadcasts.push(txid.clone());
        Ok(txid)
    }
}

/// Deterministic in-memory [`ContentEncoder`].
#[derive(Default)]
pub struct MockEncoder {
    commit_value: Amount,
}

impl MockEncoder {
    /// Create an encoder whose inspected commits carry 10k base units.
    pub fn new() -> Self {
        Self {
            commit_value: Amount(10_000),
        }
    }
}

#[async_trait]
impl ContentEncoder for MockEncoder {
    async fn inspect_commit(&self, raw_tx: &[u8]) -> Result<CommitOutput, ChainError> {
        if raw_tx.is_empty() {
            return Err(ChainError::Encoding("empty commit transaction".into()));
        }
        Ok(CommitOutput {
            index: 0,
            value: self.commit_value,
        })
    }

    async fn build_reveal(&self, request: &RevealRequest) -> Result<RevealTemplate, ChainError> {
        // Reveal bytes derive only from the request, so re-building after a
        // crash produces the same transaction and the same id.
        let digest = blake3::hash(
            format!(
                "reveal:{}:{}:{}:{}",
                request.commit_txid, request.output.index, request.content.uri,
                request.reveal_pubkey
            )
            .as_bytes(),
        );
        let raw_tx = digest.as_bytes().to_vec();
        let content_id = ContentId(format!("{}i0", hex::encode(digest.as_bytes())));
        Ok(RevealTemplate { raw_tx, content_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintline_types::ContentRef;

    #[tokio::test]
    async fn test_scripted_sequence_then_settles() {
        let chain = MockChain::new();
        let txid = TxId::new("tx1");
        chain.script(
            txid.clone(),
            vec![
                TxStatusReport::not_found(),
                TxStatusReport::pending(),
                TxStatusReport::finalized(6, 100),
            ],
        );

        assert!(!chain.transaction_status(&txid).await.unwrap().found);
        assert!(chain.transaction_status(&txid).await.unwrap().found);
        assert!(chain.transaction_status(&txid).await.unwrap().is_settled());
        // Final report repeats.
        assert!(chain.transaction_status(&txid).await.unwrap().is_settled());
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_not_found() {
        let chain = MockChain::new();
        let report = chain
            .transaction_status(&TxId::new("missing"))
            .await
            .unwrap();
        assert!(!report.found);
    }

    #[tokio::test]
    async fn test_broadcast_is_deterministic_and_recorded() {
        let chain = MockChain::new();
        let txid = chain.broadcast(b"raw-tx").await.unwrap();
        assert_eq!(txid, MockChain::txid_for(b"raw-tx"));
        assert_eq!(chain.broadcasts(), vec![txid]);
    }

    #[tokio::test]
    async fn test_rejected_broadcast() {
        let chain = MockChain::new();
        chain.reject_next_broadcast("mempool full");
        let err = chain.broadcast(b"raw").await.unwrap_err();
        assert!(matches!(err, ChainError::Rejected(_)));
        // Only the next broadcast is rejected.
        assert!(chain.broadcast(b"raw").await.is_ok());
    }

    #[tokio::test]
    async fn test_reveal_construction_is_deterministic() {
        let encoder = MockEncoder::new();
        let request = RevealRequest {
            commit_txid: TxId::new("commit"),
            output: CommitOutput {
                index: 0,
                value: Amount(10_000),
            },
            content: ContentRef::new("ipfs://x/0.png", "image/png"),
            reveal_pubkey: "aa".repeat(32),
        };
        let a = encoder.build_reveal(&request).await.unwrap();
        let b = encoder.build_reveal(&request).await.unwrap();
        assert_eq!(a.raw_tx, b.raw_tx);
        assert_eq!(a.content_id, b.content_id);
    }
}
