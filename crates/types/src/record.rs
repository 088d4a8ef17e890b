//! Mint records: the durable audit trail of broadcast attempts.
//!
//! A [`Reservation`](crate::Reservation) is the concurrency-control
//! primitive; a [`MintRecord`] is the audit trail. They correlate 1:1 once a
//! reservation converts into a broadcast attempt. The two chain models carry
//! different lifecycle state behind the [`Lifecycle`] tagged variant so the
//! reconciliation poller never branches on chain type directly.

use crate::{
    Amount, CollectionId, ContentId, ItemId, MintRecordId, PhaseId, ReservationId, Timestamp, TxId,
    WalletAddress,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// States of the two-transaction commit/reveal machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitRevealStatus {
    /// Record created, commit transaction not yet supplied.
    AwaitingCommit,
    /// Commit broadcast, waiting for confirmation depth.
    CommitBroadcast,
    /// Commit confirmed; reveal may now be constructed.
    CommitConfirmed,
    /// Reveal template built and persisted, broadcast not yet observed.
    RevealCreated,
    /// Reveal broadcast, waiting for confirmation.
    RevealBroadcast,
    /// Reveal confirmed; the item is minted. Terminal.
    Completed,
    /// Rolled back. Terminal.
    Failed,
}

impl CommitRevealStatus {
    /// Whether this status can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommitRevealStatus::Completed | CommitRevealStatus::Failed)
    }
}

/// States of the single-transaction submit/confirm machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitConfirmStatus {
    /// Record created, signed transaction not yet supplied.
    AwaitingSignature,
    /// Broadcast, polled toward finality.
    Confirming,
    /// Finalized without execution error; the item is minted. Terminal.
    Confirmed,
    /// Rolled back. Terminal.
    Failed,
}

impl SubmitConfirmStatus {
    /// Whether this status can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmitConfirmStatus::Confirmed | SubmitConfirmStatus::Failed)
    }
}

/// The commit transaction output the reveal spends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutput {
    /// Output index within the commit transaction.
    pub index: u32,
    /// Output value.
    pub value: Amount,
}

/// Per-record state for the commit/reveal model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRevealState {
    /// Machine status.
    pub status: CommitRevealStatus,
    /// Commit transaction id, once broadcast.
    pub commit_txid: Option<TxId>,
    /// When the commit reached confirmation depth.
    pub commit_confirmed_at: Option<Timestamp>,
    /// The commit output designated for the reveal to spend.
    pub commit_output: Option<CommitOutput>,
    /// Reveal transaction id, once broadcast.
    pub reveal_txid: Option<TxId>,
    /// When the reveal confirmed.
    pub reveal_confirmed_at: Option<Timestamp>,
    /// Content id assigned by the encoder at reveal construction.
    pub content_id: Option<ContentId>,
    /// Public key of the ephemeral pair generated for this mint, hex.
    pub reveal_pubkey: Option<String>,
    /// The constructed reveal transaction, hex. Persisted before broadcast
    /// so a crashed `submit_reveal` can re-broadcast the same template.
    pub reveal_raw: Option<String>,
}

impl CommitRevealState {
    /// Fresh state awaiting a commit transaction.
    pub fn new() -> Self {
        Self {
            status: CommitRevealStatus::AwaitingCommit,
            commit_txid: None,
            commit_confirmed_at: None,
            commit_output: None,
            reveal_txid: None,
            reveal_confirmed_at: None,
            content_id: None,
            reveal_pubkey: None,
            reveal_raw: None,
        }
    }
}

impl Default for CommitRevealState {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-record state for the submit/confirm model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitConfirmState {
    /// Machine status.
    pub status: SubmitConfirmStatus,
    /// Mint transaction signature, once broadcast.
    pub signature: Option<TxId>,
    /// The inventory mint address targeted on-chain, when known.
    pub mint_address: Option<WalletAddress>,
    /// When the transaction finalized.
    pub confirmed_at: Option<Timestamp>,
}

impl SubmitConfirmState {
    /// Fresh state awaiting a signed transaction.
    pub fn new() -> Self {
        Self {
            status: SubmitConfirmStatus::AwaitingSignature,
            signature: None,
            mint_address: None,
            confirmed_at: None,
        }
    }
}

impl Default for SubmitConfirmState {
    fn default() -> Self {
        Self::new()
    }
}

/// Chain-model-specific lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "model")]
pub enum Lifecycle {
    /// Two-transaction inscription flow.
    CommitReveal(CommitRevealState),
    /// Single-transaction flow.
    SubmitConfirm(SubmitConfirmState),
}

impl Lifecycle {
    /// Whether the record can never change again.
    pub fn is_terminal(&self) -> bool {
        match self {
            Lifecycle::CommitReveal(s) => s.status.is_terminal(),
            Lifecycle::SubmitConfirm(s) => s.status.is_terminal(),
        }
    }

    /// Whether the record finished successfully.
    pub fn is_success(&self) -> bool {
        match self {
            Lifecycle::CommitReveal(s) => s.status == CommitRevealStatus::Completed,
            Lifecycle::SubmitConfirm(s) => s.status == SubmitConfirmStatus::Confirmed,
        }
    }

    /// The transaction the reconciliation poller should query, if any.
    pub fn in_flight_txid(&self) -> Option<&TxId> {
        match self {
            Lifecycle::CommitReveal(s) => match s.status {
                CommitRevealStatus::CommitBroadcast => s.commit_txid.as_ref(),
                CommitRevealStatus::RevealCreated | CommitRevealStatus::RevealBroadcast => {
                    s.reveal_txid.as_ref()
                }
                _ => None,
            },
            Lifecycle::SubmitConfirm(s) => match s.status {
                SubmitConfirmStatus::Confirming => s.signature.as_ref(),
                _ => None,
            },
        }
    }

    /// The most recent transaction broadcast for this record, in flight or
    /// not.
    ///
    /// `commit_confirmed` and `reveal_created` report `None` from
    /// [`Lifecycle::in_flight_txid`] because nothing is being polled, yet a
    /// commit is already settled on-chain; this accessor still surfaces it.
    pub fn broadcast_txid(&self) -> Option<&TxId> {
        match self {
            Lifecycle::CommitReveal(s) => s.reveal_txid.as_ref().or(s.commit_txid.as_ref()),
            Lifecycle::SubmitConfirm(s) => s.signature.as_ref(),
        }
    }

    /// Short human-readable state label for status queries and logs.
    pub fn state_label(&self) -> &'static str {
        match self {
            Lifecycle::CommitReveal(s) => match s.status {
                CommitRevealStatus::AwaitingCommit => "awaiting_commit",
                CommitRevealStatus::CommitBroadcast => "commit_broadcast",
                CommitRevealStatus::CommitConfirmed => "commit_confirmed",
                CommitRevealStatus::RevealCreated => "reveal_created",
                CommitRevealStatus::RevealBroadcast => "reveal_broadcast",
                CommitRevealStatus::Completed => "completed",
                CommitRevealStatus::Failed => "failed",
            },
            Lifecycle::SubmitConfirm(s) => match s.status {
                SubmitConfirmStatus::AwaitingSignature => "awaiting_signature",
                SubmitConfirmStatus::Confirming => "confirming",
                SubmitConfirmStatus::Confirmed => "confirmed",
                SubmitConfirmStatus::Failed => "failed",
            },
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.state_label())
    }
}

/// The durable audit trail of one mint attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRecord {
    /// Identifier.
    pub id: MintRecordId,
    /// Owning collection.
    pub collection: CollectionId,
    /// The reserved item. `None` for chain-native sequential allocation,
    /// resolved to the lowest unflagged item at completion.
    pub item: Option<ItemId>,
    /// The reservation this record fulfils.
    pub reservation: ReservationId,
    /// Wallet that signs and pays.
    pub minter: WalletAddress,
    /// Wallet that receives the item.
    pub recipient: WalletAddress,
    /// Phase the mint was granted under.
    pub phase: Option<PhaseId>,
    /// Price paid.
    pub price: Amount,
    /// Error payload when the record failed.
    pub error: Option<String>,
    /// Chain-model-specific lifecycle state.
    pub lifecycle: Lifecycle,
    /// Last confirmation depth observed by the poller.
    pub confirmations: u64,
    /// Consecutive polls that found the transaction absent.
    pub poll_attempts: u32,
    /// When the poller last queried chain state for this record.
    pub last_checked: Option<Timestamp>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last mutation time.
    pub updated_at: Timestamp,
}

impl MintRecord {
    /// Whether the record can never change again.
    pub fn is_terminal(&self) -> bool {
        self.lifecycle.is_terminal()
    }
}
