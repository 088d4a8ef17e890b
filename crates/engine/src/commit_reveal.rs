//! Commit/reveal lifecycle driver.
//!
//! The two-transaction inscription flow: the buyer funds a commit
//! transaction, the engine broadcasts it, and once it confirms the engine
//! constructs and broadcasts the reveal that carries the content. The reveal
//! template is persisted before its broadcast, so a crash between the two
//! steps resumes with the same template instead of constructing a second,
//! conflicting reveal.

use crate::{Engine, SubmitError};
use mintline_chain::{EphemeralKey, RevealRequest};
use mintline_types::{
    Amount, ChainModel, CommitRevealState, CommitRevealStatus, ContentId, Lifecycle, MintRecord,
    MintRecordId, Reservation, ReservationId, ReservationStatus, TxId, WalletAddress,
};
use tracing::info;

/// Result of a reveal broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealOutcome {
    /// Reveal transaction id.
    pub txid: TxId,
    /// The content id the inscription carries.
    pub content_id: ContentId,
}

impl Engine {
    /// Load a reservation that still holds its item.
    ///
    /// A lapsed hold reports its effective status, `Expired`, even before
    /// the sweep has materialized it.
    pub(crate) fn active_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Reservation, SubmitError> {
        let Some(reservation) = self.store.reservation(id)? else {
            return Err(SubmitError::UnknownReservation(id));
        };
        let now = self.clock.now();
        if reservation.status == ReservationStatus::Reserved && reservation.is_lapsed(now) {
            return Err(SubmitError::ReservationNotActive {
                status: ReservationStatus::Expired,
            });
        }
        if reservation.status != ReservationStatus::Reserved {
            return Err(SubmitError::ReservationNotActive {
                status: reservation.status,
            });
        }
        Ok(reservation)
    }

    /// Price granted to a reservation, from its phase.
    pub(crate) fn reservation_price(
        &self,
        reservation: &Reservation,
    ) -> Result<Amount, SubmitError> {
        match reservation.phase {
            Some(phase) => Ok(self
                .store
                .phase(phase)?
                .map(|p| p.price)
                .unwrap_or(Amount(0))),
            None => Ok(Amount(0)),
        }
    }

    /// Accept a buyer-funded commit transaction and broadcast it.
    ///
    /// Idempotent per reservation: resubmitting after a broadcast returns
    /// the existing record with its original commit txid instead of
    /// broadcasting twice.
    pub async fn submit_commit(
        &self,
        reservation: ReservationId,
        recipient: WalletAddress,
        commit_raw: &[u8],
    ) -> Result<MintRecord, SubmitError> {
        let reservation = self.active_reservation(reservation)?;

        let model = self
            .store
            .collection(reservation.collection)?
            .map(|c| c.model)
            .ok_or(SubmitError::UnknownReservation(reservation.id))?;
        if model != ChainModel::CommitReveal {
            return Err(SubmitError::WrongChainModel);
        }

        let mut record = match self.store.record_for_reservation(reservation.id)? {
            Some(record) => match &record.lifecycle {
                Lifecycle::CommitReveal(state) => {
                    if state.commit_txid.is_some() {
                        // Resubmission: the commit is already on the wire.
                        return Ok(record);
                    }
                    record
                }
                Lifecycle::SubmitConfirm(_) => return Err(SubmitError::WrongChainModel),
            },
            None => {
                let now = self.clock.now();
                let record = MintRecord {
                    id: MintRecordId::generate(),
                    collection: reservation.collection,
                    item: Some(reservation.item),
                    reservation: reservation.id,
                    minter: reservation.wallet.clone(),
                    recipient,
                    phase: reservation.phase,
                    price: self.reservation_price(&reservation)?,
                    error: None,
                    lifecycle: Lifecycle::CommitReveal(CommitRevealState::new()),
                    confirmations: 0,
                    poll_attempts: 0,
                    last_checked: None,
                    created_at: now,
                    updated_at: now,
                };
                self.store.put_record(&record)?;
                record
            }
        };

        let output = self.encoder.inspect_commit(commit_raw).await?;
        let txid = self
            .chain_for(ChainModel::CommitReveal)
            .broadcast(commit_raw)
            .await?;

        if let Lifecycle::CommitReveal(state) = &mut record.lifecycle {
            state.status = CommitRevealStatus::CommitBroadcast;
            state.commit_txid = Some(txid.clone());
            state.commit_output = Some(output);
        }
        record.updated_at = self.clock.now();
        self.store.put_record(&record)?;

        info!(
            record = %record.id,
            reservation = %record.reservation,
            commit = %txid,
            "commit broadcast"
        );
        Ok(record)
    }

    /// Construct and broadcast the reveal for a confirmed commit.
    ///
    /// Requires `commit_confirmed`, or `reveal_created` when resuming a
    /// crashed attempt with its persisted template. Once the reveal is on
    /// the wire, re-invocation returns the existing outcome. Does not check
    /// the reservation TTL: a hold with a broadcast commit is protected
    /// until the lifecycle reaches a terminal state.
    pub async fn submit_reveal(
        &self,
        reservation: ReservationId,
    ) -> Result<RevealOutcome, SubmitError> {
        let mut record = self
            .store
            .record_for_reservation(reservation)?
            .ok_or(SubmitError::UnknownReservation(reservation))?;

        let state = match &mut record.lifecycle {
            Lifecycle::CommitReveal(state) => state,
            Lifecycle::SubmitConfirm(_) => return Err(SubmitError::WrongChainModel),
        };

        let raw = match state.status {
            CommitRevealStatus::RevealBroadcast | CommitRevealStatus::Completed => {
                // Already on the wire; hand back the original outcome.
                if let (Some(txid), Some(content_id)) =
                    (state.reveal_txid.clone(), state.content_id.clone())
                {
                    return Ok(RevealOutcome { txid, content_id });
                }
                return Err(SubmitError::InvalidState {
                    expected: "commit_confirmed",
                    found: record.lifecycle.state_label(),
                });
            }
            CommitRevealStatus::CommitConfirmed => {
                let commit_txid = state
                    .commit_txid
                    .clone()
                    .ok_or(SubmitError::InvalidState {
                        expected: "commit_confirmed",
                        found: "commit_confirmed without commit txid",
                    })?;
                let output = state.commit_output.ok_or(SubmitError::InvalidState {
                    expected: "commit_confirmed",
                    found: "commit_confirmed without commit output",
                })?;
                let item = record.item.ok_or(SubmitError::MissingItem)?;
                let content = self
                    .store
                    .item(item)?
                    .ok_or(SubmitError::MissingItem)?
                    .content;

                let ephemeral = EphemeralKey::generate();
                let template = self
                    .encoder
                    .build_reveal(&RevealRequest {
                        commit_txid,
                        output,
                        content,
                        reveal_pubkey: ephemeral.public_hex(),
                    })
                    .await?;

                // Persist the template before broadcasting it. A crash past
                // this point resumes from `reveal_created` with the same
                // bytes.
                state.status = CommitRevealStatus::RevealCreated;
                state.reveal_raw = Some(hex::encode(&template.raw_tx));
                state.content_id = Some(template.content_id);
                state.reveal_pubkey = Some(ephemeral.public_hex());
                record.updated_at = self.clock.now();
                self.store.put_record(&record)?;
                template.raw_tx
            }
            CommitRevealStatus::RevealCreated => {
                let raw_hex = state.reveal_raw.as_deref().ok_or(SubmitError::InvalidState {
                    expected: "reveal_created",
                    found: "reveal_created without template",
                })?;
                hex::decode(raw_hex)
                    .map_err(|e| mintline_chain::ChainError::Encoding(e.to_string()))?
            }
            CommitRevealStatus::AwaitingCommit
            | CommitRevealStatus::CommitBroadcast
            | CommitRevealStatus::Failed => {
                return Err(SubmitError::InvalidState {
                    expected: "commit_confirmed",
                    found: record.lifecycle.state_label(),
                });
            }
        };

        let txid = self
            .chain_for(ChainModel::CommitReveal)
            .broadcast(&raw)
            .await?;

        let content_id = match &mut record.lifecycle {
            Lifecycle::CommitReveal(state) => {
                state.status = CommitRevealStatus::RevealBroadcast;
                state.reveal_txid = Some(txid.clone());
                state
                    .content_id
                    .clone()
                    .ok_or(SubmitError::InvalidState {
                        expected: "reveal_created",
                        found: "reveal_created without content id",
                    })?
            }
            Lifecycle::SubmitConfirm(_) => return Err(SubmitError::WrongChainModel),
        };
        record.updated_at = self.clock.now();
        self.store.put_record(&record)?;

        info!(
            record = %record.id,
            reveal = %txid,
            content = %content_id,
            "reveal broadcast"
        );
        Ok(RevealOutcome { txid, content_id })
    }
}
