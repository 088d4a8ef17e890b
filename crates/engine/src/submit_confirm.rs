//! Submit/confirm lifecycle driver.
//!
//! The single-transaction flow: the buyer's wallet signs a prepared mint
//! transaction, the engine broadcasts it and polls it toward finality. When
//! the delegated-signer guard is enabled, every submission must carry an
//! authorization bound to its reservation and minter, so a client cannot
//! mint around the allocation engine by crafting the transaction itself.

use crate::{Engine, SubmitError};
use mintline_chain::AgentAuthorization;
use mintline_types::{
    ChainModel, Lifecycle, MintRecord, MintRecordId, ReservationId, SubmitConfirmState,
    SubmitConfirmStatus, WalletAddress,
};
use tracing::{info, warn};

impl Engine {
    /// Issue a mint authorization for an active reservation.
    ///
    /// The signature binds the reservation id and its minter wallet; it is
    /// useless for any other reservation or wallet.
    pub fn authorize_mint(
        &self,
        reservation: ReservationId,
    ) -> Result<AgentAuthorization, SubmitError> {
        let reservation = self.active_reservation(reservation)?;
        let signer = self
            .signer
            .as_ref()
            .ok_or(SubmitError::AuthorizationUnavailable)?;
        Ok(signer.authorize(reservation.id, &reservation.wallet))
    }

    /// Accept a wallet-signed mint transaction and broadcast it.
    ///
    /// Idempotent per reservation: resubmitting after a broadcast returns
    /// the existing record with its original signature instead of
    /// broadcasting twice.
    pub async fn submit_mint(
        &self,
        reservation: ReservationId,
        recipient: WalletAddress,
        signed_raw: &[u8],
        authorization: Option<&AgentAuthorization>,
    ) -> Result<MintRecord, SubmitError> {
        let reservation = self.active_reservation(reservation)?;

        let model = self
            .store
            .collection(reservation.collection)?
            .map(|c| c.model)
            .ok_or(SubmitError::UnknownReservation(reservation.id))?;
        if model != ChainModel::SubmitConfirm {
            return Err(SubmitError::WrongChainModel);
        }

        if let Some(signer) = &self.signer {
            let Some(authorization) = authorization else {
                return Err(SubmitError::AuthorizationMissing);
            };
            if !signer
                .verifier()
                .verify(reservation.id, &reservation.wallet, authorization)
            {
                warn!(
                    reservation = %reservation.id,
                    wallet = %reservation.wallet,
                    "rejected mint with invalid authorization"
                );
                return Err(SubmitError::AuthorizationInvalid);
            }
        }

        let mut record = match self.store.record_for_reservation(reservation.id)? {
            Some(record) => match &record.lifecycle {
                Lifecycle::SubmitConfirm(state) => {
                    if state.signature.is_some() {
                        // Resubmission: already on the wire.
                        return Ok(record);
                    }
                    record
                }
                Lifecycle::CommitReveal(_) => return Err(SubmitError::WrongChainModel),
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
                    lifecycle: Lifecycle::SubmitConfirm(SubmitConfirmState::new()),
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

        let txid = self
            .chain_for(ChainModel::SubmitConfirm)
            .broadcast(signed_raw)
            .await?;

        if let Lifecycle::SubmitConfirm(state) = &mut record.lifecycle {
            state.status = SubmitConfirmStatus::Confirming;
            state.signature = Some(txid.clone());
        }
        record.updated_at = self.clock.now();
        self.store.put_record(&record)?;

        info!(
            record = %record.id,
            reservation = %record.reservation,
            signature = %txid,
            "mint transaction broadcast"
        );
        Ok(record)
    }
}
