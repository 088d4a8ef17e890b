//! Pre-paid credit payments.
//!
//! Additive semantics: completing a payment adds credits to the wallet's
//! balance, so the only idempotency concern is granting them exactly once.
//! The status-equality guard on `complete_payment` provides that.

use crate::{Engine, EngineError};
use mintline_types::{
    Amount, PaymentId, PaymentStatus, PendingPayment, TxId, WalletAddress,
};
use tracing::{info, warn};

impl Engine {
    /// Register a claimed credits purchase for verification.
    pub fn register_payment(
        &self,
        wallet: WalletAddress,
        expected_amount: Amount,
        network: impl Into<String>,
        credits: u64,
        observed_txid: Option<TxId>,
    ) -> Result<PendingPayment, EngineError> {
        let now = self.clock.now();
        let payment = PendingPayment {
            id: PaymentId::generate(),
            wallet,
            expected_amount,
            network: network.into(),
            credits,
            status: PaymentStatus::Pending,
            observed_txid,
            confirmations: 0,
            last_checked: None,
            created_at: now,
            expires_at: now.saturating_add(self.config.payment_expiry),
        };
        self.store.put_payment(&payment)?;
        info!(payment = %payment.id, wallet = %payment.wallet, "payment registered");
        Ok(payment)
    }

    /// Attach the buyer-claimed transaction to a pending payment.
    pub fn claim_payment_txid(
        &self,
        payment: PaymentId,
        txid: TxId,
    ) -> Result<PendingPayment, EngineError> {
        let mut row = self.load_payment(payment)?;
        if !row.is_terminal() {
            row.observed_txid = Some(txid);
            self.store.put_payment(&row)?;
        }
        Ok(row)
    }

    /// Complete a payment and grant its credits.
    ///
    /// Returns `Ok(false)` when the payment is already terminal; the grant
    /// then does not run again.
    pub fn complete_payment(&self, payment: PaymentId) -> Result<bool, EngineError> {
        let mut row = self.load_payment(payment)?;
        if row.is_terminal() {
            return Ok(false);
        }
        row.status = PaymentStatus::Completed;
        self.store.put_payment(&row)?;
        let balance = self.store.add_credits(&row.wallet, row.credits)?;
        info!(
            payment = %row.id,
            wallet = %row.wallet,
            credits = row.credits,
            balance,
            "payment completed, credits granted"
        );
        Ok(true)
    }

    /// Mark a payment failed or expired. Grants nothing.
    pub fn close_payment(
        &self,
        payment: PaymentId,
        status: PaymentStatus,
    ) -> Result<bool, EngineError> {
        debug_assert!(matches!(
            status,
            PaymentStatus::Failed | PaymentStatus::Expired
        ));
        let mut row = self.load_payment(payment)?;
        if row.is_terminal() {
            return Ok(false);
        }
        row.status = status;
        self.store.put_payment(&row)?;
        warn!(payment = %row.id, status = %status, "payment closed without credits");
        Ok(true)
    }

    /// Record the outcome of one payment poll.
    pub fn note_payment_poll(
        &self,
        payment: PaymentId,
        confirmations: Option<u64>,
    ) -> Result<(), EngineError> {
        let mut row = self.load_payment(payment)?;
        row.last_checked = Some(self.clock.now());
        if let Some(depth) = confirmations {
            row.confirmations = depth;
        }
        self.store.put_payment(&row)?;
        Ok(())
    }

    /// Credit balance for a wallet.
    pub fn credits(&self, wallet: &WalletAddress) -> Result<u64, EngineError> {
        Ok(self.store.credits(wallet)?)
    }

    fn load_payment(&self, id: PaymentId) -> Result<PendingPayment, EngineError> {
        self.store
            .payment(id)?
            .ok_or(EngineError::UnknownPayment(id))
    }
}
