//! The reconciliation poller.
//!
//! Chain state is ground truth; stored lifecycle state is a cache of it.
//! Each run queries the indexer for every eligible in-flight transaction
//! and folds the answer back through the engine's idempotent transition
//! entry points. Crash anywhere, rerun, and the same answers produce the
//! same terminal states.

use crate::ReconcileConfig;
use mintline_chain::ChainClient;
use mintline_engine::{Engine, EngineError};
use mintline_types::{
    CommitRevealStatus, Lifecycle, MintRecord, PaymentStatus, TxId, TxStatusReport,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Outcome counts of one transaction reconciliation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records examined this run.
    pub examined: usize,
    /// Commits that reached confirmation.
    pub commits_confirmed: usize,
    /// Records driven to their success terminal state.
    pub completed: usize,
    /// Records driven to their failure terminal state.
    pub failed: usize,
    /// Records still awaiting an answer.
    pub pending: usize,
}

/// Polls chain state and reconciles records and payments against it.
pub struct Reconciler {
    engine: Arc<Engine>,
    commit_reveal_chain: Arc<dyn ChainClient>,
    submit_confirm_chain: Arc<dyn ChainClient>,
    config: ReconcileConfig,
}

impl Reconciler {
    /// Create a reconciler over an engine and its two chain clients.
    pub fn new(
        engine: Arc<Engine>,
        commit_reveal_chain: Arc<dyn ChainClient>,
        submit_confirm_chain: Arc<dyn ChainClient>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            engine,
            commit_reveal_chain,
            submit_confirm_chain,
            config,
        }
    }

    /// Run the poll loop until `shutdown` flips to true.
    ///
    /// Each tick sweeps expired reservations, reconciles in-flight
    /// transactions, then reconciles pending payments. Errors are logged
    /// and the loop keeps going; a dead poller is worse than a noisy one.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval = ?self.config.poll_interval, "reconciler started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.engine.sweep_expired_reservations() {
                        warn!(error = %e, "reservation sweep failed");
                    }
                    if let Err(e) = self.reconcile_pending_transactions().await {
                        warn!(error = %e, "transaction reconciliation failed");
                    }
                    if let Err(e) = self.reconcile_pending_payments().await {
                        warn!(error = %e, "payment reconciliation failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("reconciler stopping");
                        return;
                    }
                }
            }
        }
    }

    /// Reconcile non-terminal mint records against chain state.
    pub async fn reconcile_pending_transactions(&self) -> Result<ReconcileReport, EngineError> {
        let now = self.engine.clock().now();
        let mut report = ReconcileReport::default();

        let records: Vec<MintRecord> = self
            .engine
            .store()
            .pending_records()?
            .into_iter()
            .filter(|r| now.elapsed_at_least(r.created_at, self.config.min_age))
            .filter(|r| match r.last_checked {
                Some(at) => now.elapsed_at_least(at, self.config.recheck_cooldown),
                None => true,
            })
            .take(self.config.max_items_per_run)
            .collect();

        for record in records {
            report.examined += 1;
            let Some(txid) = record.lifecycle.in_flight_txid().cloned() else {
                if matches!(
                    &record.lifecycle,
                    Lifecycle::CommitReveal(state) if matches!(
                        state.status,
                        CommitRevealStatus::CommitConfirmed | CommitRevealStatus::RevealCreated
                    )
                ) {
                    // The commit is settled but the reveal never made it onto
                    // the wire; drive it again from the persisted state.
                    match self.engine.submit_reveal(record.reservation).await {
                        Ok(outcome) => {
                            info!(record = %record.id, reveal = %outcome.txid, "reveal rebroadcast");
                        }
                        Err(e) => {
                            warn!(record = %record.id, error = %e, "reveal rebroadcast failed");
                        }
                    }
                    report.pending += 1;
                    continue;
                }
                // Nothing on the wire. Abandon the attempt once it is clear
                // no transaction is coming.
                if now.elapsed_at_least(record.created_at, self.config.drop_age)
                    && self
                        .engine
                        .fail_record(record.id, "abandoned without a transaction")?
                {
                    report.failed += 1;
                } else {
                    report.pending += 1;
                }
                continue;
            };

            let status = match self.chain_for(&record).transaction_status(&txid).await {
                Ok(status) => status,
                Err(e) => {
                    debug!(record = %record.id, error = %e, "chain query failed, will retry");
                    report.pending += 1;
                    continue;
                }
            };

            self.apply_status(&record, &txid, &status, &mut report).await?;
        }

        if report.examined > 0 {
            debug!(?report, "transaction reconciliation run");
        }
        Ok(report)
    }

    async fn apply_status(
        &self,
        record: &MintRecord,
        txid: &TxId,
        status: &TxStatusReport,
        report: &mut ReconcileReport,
    ) -> Result<(), EngineError> {
        if !status.found {
            let attempts = self.engine.note_poll(record.id, None)?;
            if attempts >= self.config.max_poll_attempts {
                warn!(
                    record = %record.id,
                    tx = %txid,
                    attempts,
                    "transaction never appeared, failing record"
                );
                if self.engine.fail_record(record.id, "transaction not found on chain")? {
                    report.failed += 1;
                    return Ok(());
                }
            }
            report.pending += 1;
            return Ok(());
        }

        self.engine.note_poll(record.id, Some(status.confirmations))?;

        if status.is_execution_failure() {
            let reason = status.error.as_deref().unwrap_or("execution failed");
            if self.engine.fail_record(record.id, reason)? {
                report.failed += 1;
            }
            return Ok(());
        }

        match &record.lifecycle {
            Lifecycle::CommitReveal(state) => match state.status {
                CommitRevealStatus::CommitBroadcast if status.confirmed => {
                    if self.engine.mark_commit_confirmed(record.id)? {
                        report.commits_confirmed += 1;
                        // The reveal follows immediately; a failure here is
                        // retried on a later run from the persisted state.
                        match self.engine.submit_reveal(record.reservation).await {
                            Ok(outcome) => {
                                info!(
                                    record = %record.id,
                                    reveal = %outcome.txid,
                                    "reveal constructed and broadcast"
                                );
                            }
                            Err(e) => {
                                warn!(record = %record.id, error = %e, "reveal construction failed");
                            }
                        }
                    }
                }
                CommitRevealStatus::RevealBroadcast if status.is_settled() => {
                    if self.engine.complete_record(record.id)? {
                        report.completed += 1;
                    }
                }
                _ => report.pending += 1,
            },
            Lifecycle::SubmitConfirm(_) => {
                if status.is_settled() {
                    if self.engine.complete_record(record.id)? {
                        report.completed += 1;
                    }
                } else {
                    report.pending += 1;
                }
            }
        }
        Ok(())
    }

    /// Reconcile pending payments: expire the overdue, verify the rest.
    pub async fn reconcile_pending_payments(&self) -> Result<(), EngineError> {
        let now = self.engine.clock().now();
        for payment in self.engine.store().pending_payments()? {
            if payment.is_past_deadline(now) {
                self.engine
                    .close_payment(payment.id, PaymentStatus::Expired)?;
                continue;
            }
            let Some(txid) = payment.observed_txid.clone() else {
                continue;
            };
            if let Some(at) = payment.last_checked {
                if !now.elapsed_at_least(at, self.config.recheck_cooldown) {
                    continue;
                }
            }

            let chain = self.chain_for_network(&payment.network);
            let status = match chain.transaction_status(&txid).await {
                Ok(status) => status,
                Err(e) => {
                    debug!(payment = %payment.id, error = %e, "payment query failed");
                    continue;
                }
            };

            if status.is_execution_failure() {
                self.engine
                    .close_payment(payment.id, PaymentStatus::Failed)?;
            } else if status.found && status.confirmations >= self.config.payment_confirmations {
                self.engine.complete_payment(payment.id)?;
            } else {
                self.engine
                    .note_payment_poll(payment.id, status.found.then_some(status.confirmations))?;
            }
        }
        Ok(())
    }

    fn chain_for(&self, record: &MintRecord) -> &Arc<dyn ChainClient> {
        match record.lifecycle {
            Lifecycle::CommitReveal(_) => &self.commit_reveal_chain,
            Lifecycle::SubmitConfirm(_) => &self.submit_confirm_chain,
        }
    }

    fn chain_for_network(&self, network: &str) -> &Arc<dyn ChainClient> {
        match network {
            "btc" => &self.commit_reveal_chain,
            _ => &self.submit_confirm_chain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintline_test_helpers::{harness, harness_with, Harness};
    use mintline_engine::EngineConfig;
    use mintline_types::{Amount, ChainModel, ReservationStatus, WalletAddress};
    use std::time::Duration;

    fn reconciler(h: &Harness, config: ReconcileConfig) -> Reconciler {
        Reconciler::new(
            Arc::clone(&h.engine),
            Arc::clone(&h.chain) as _,
            Arc::clone(&h.chain) as _,
            config,
        )
    }

    #[tokio::test]
    async fn test_commit_confirmation_advances_record() {
        let h = harness();
        let collection = h.seed_collection(ChainModel::CommitReveal, 1);
        h.seed_open_phase(collection.id);
        let wallet = WalletAddress::new("w1");
        let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
        let record = h
            .engine
            .submit_commit(reservation.id, wallet, b"commit-bytes")
            .await
            .unwrap();
        let txid = record.lifecycle.in_flight_txid().unwrap().clone();

        h.chain.set_status(txid, TxStatusReport::confirmed(1, 100));
        let r = reconciler(&h, ReconcileConfig::eager());
        let report = r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(report.commits_confirmed, 1);

        // The reveal is constructed and broadcast in the same run.
        let row = h.engine.store().record(record.id).unwrap().unwrap();
        assert_eq!(row.lifecycle.state_label(), "reveal_broadcast");
        assert_eq!(h.chain.broadcasts().len(), 2);
    }

    #[tokio::test]
    async fn test_interrupted_reveal_broadcast_is_retried() {
        let h = harness();
        let collection = h.seed_collection(ChainModel::CommitReveal, 1);
        h.seed_open_phase(collection.id);
        let wallet = WalletAddress::new("w1");
        let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
        let record = h
            .engine
            .submit_commit(reservation.id, wallet, b"commit-bytes")
            .await
            .unwrap();
        let commit = record.lifecycle.in_flight_txid().unwrap().clone();
        h.chain.set_status(commit, TxStatusReport::confirmed(1, 100));

        // The reveal broadcast fails right after the commit confirms; the
        // record is left with its persisted template and nothing in flight.
        h.chain.reject_next_broadcast("mempool full");
        let r = reconciler(&h, ReconcileConfig::eager());
        r.reconcile_pending_transactions().await.unwrap();
        let row = h.engine.store().record(record.id).unwrap().unwrap();
        assert_eq!(row.lifecycle.state_label(), "reveal_created");
        assert_eq!(h.chain.broadcasts().len(), 1);

        // The next run re-broadcasts the same template.
        let report = r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(report.pending, 1);
        let row = h.engine.store().record(record.id).unwrap().unwrap();
        assert_eq!(row.lifecycle.state_label(), "reveal_broadcast");
        assert_eq!(h.chain.broadcasts().len(), 2);
    }

    #[tokio::test]
    async fn test_reveal_finality_completes_the_mint() {
        let h = harness();
        let collection = h.seed_collection(ChainModel::CommitReveal, 1);
        h.seed_open_phase(collection.id);
        let wallet = WalletAddress::new("w1");
        let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
        let record = h
            .engine
            .submit_commit(reservation.id, wallet, b"commit-bytes")
            .await
            .unwrap();
        h.engine.mark_commit_confirmed(record.id).unwrap();
        let outcome = h.engine.submit_reveal(reservation.id).await.unwrap();

        h.chain
            .set_status(outcome.txid, TxStatusReport::finalized(6, 110));
        let r = reconciler(&h, ReconcileConfig::eager());
        let report = r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(report.completed, 1);

        let item = h.engine.store().item(reservation.item).unwrap().unwrap();
        assert!(item.minted);
        assert_eq!(
            h.reservation(reservation.id).status,
            ReservationStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_execution_failure_rolls_back() {
        let h = harness();
        let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
        let phase = h.seed_phase(collection.id, |spec| spec.allocation = Some(5));
        let wallet = WalletAddress::new("w1");
        let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
        let record = h
            .engine
            .submit_mint(reservation.id, wallet, b"signed-tx", None)
            .await
            .unwrap();
        let txid = record.lifecycle.in_flight_txid().unwrap().clone();

        h.chain
            .set_status(txid, TxStatusReport::errored("insufficient funds", 90));
        let r = reconciler(&h, ReconcileConfig::eager());
        let report = r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(report.failed, 1);

        assert_eq!(
            h.reservation(reservation.id).status,
            ReservationStatus::Cancelled
        );
        assert_eq!(h.phase(phase.id).minted_count, 0);
        // The slot is reusable.
        assert!(h
            .engine
            .reserve(collection.id, &WalletAddress::new("w2"), None)
            .is_ok());
    }

    #[tokio::test]
    async fn test_not_found_fails_after_retry_ceiling() {
        let h = harness();
        let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
        h.seed_open_phase(collection.id);
        let wallet = WalletAddress::new("w1");
        let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
        h.engine
            .submit_mint(reservation.id, wallet, b"signed-tx", None)
            .await
            .unwrap();

        // No status scripted: every query reports not-found.
        let r = reconciler(&h, ReconcileConfig::eager().with_max_poll_attempts(3));
        for _ in 0..2 {
            let report = r.reconcile_pending_transactions().await.unwrap();
            assert_eq!(report.failed, 0);
        }
        let report = r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(
            h.reservation(reservation.id).status,
            ReservationStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_min_age_gates_young_records() {
        let h = harness();
        let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
        h.seed_open_phase(collection.id);
        let wallet = WalletAddress::new("w1");
        let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
        h.engine
            .submit_mint(reservation.id, wallet, b"signed-tx", None)
            .await
            .unwrap();

        let r = reconciler(
            &h,
            ReconcileConfig::eager().with_min_age(Duration::from_secs(60)),
        );
        let report = r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(report.examined, 0);
        assert_eq!(h.chain.query_count(), 0);

        h.clock.advance(Duration::from_secs(61));
        let report = r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(report.examined, 1);
    }

    #[tokio::test]
    async fn test_cooldown_limits_query_rate() {
        let h = harness();
        let collection = h.seed_collection(ChainModel::SubmitConfirm, 1);
        h.seed_open_phase(collection.id);
        let wallet = WalletAddress::new("w1");
        let reservation = h.engine.reserve(collection.id, &wallet, None).unwrap();
        h.engine
            .submit_mint(reservation.id, wallet, b"signed-tx", None)
            .await
            .unwrap();

        let r = reconciler(
            &h,
            ReconcileConfig::eager().with_recheck_cooldown(Duration::from_secs(30)),
        );
        r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(h.chain.query_count(), 1);

        // Within the cooldown the record is not re-queried.
        r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(h.chain.query_count(), 1);

        h.clock.advance(Duration::from_secs(31));
        r.reconcile_pending_transactions().await.unwrap();
        assert_eq!(h.chain.query_count(), 2);
    }

    #[tokio::test]
    async fn test_confirmed_payment_grants_credits() {
        let h = harness();
        let wallet = WalletAddress::new("payer");
        let payment = h
            .engine
            .register_payment(
                wallet.clone(),
                Amount(50_000),
                "btc",
                100,
                Some(mintline_types::TxId::new("pay-tx")),
            )
            .unwrap();

        h.chain.set_status(
            mintline_types::TxId::new("pay-tx"),
            TxStatusReport::confirmed(2, 120),
        );
        let r = reconciler(&h, ReconcileConfig::eager());
        r.reconcile_pending_payments().await.unwrap();

        assert_eq!(h.engine.credits(&wallet).unwrap(), 100);
        let row = h.engine.store().payment(payment.id).unwrap().unwrap();
        assert_eq!(row.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_overdue_payment_expires() {
        let h = harness_with(
            EngineConfig::default().with_payment_expiry(Duration::from_secs(600)),
        );
        let wallet = WalletAddress::new("payer");
        let payment = h
            .engine
            .register_payment(wallet.clone(), Amount(50_000), "btc", 100, None)
            .unwrap();

        h.clock.advance(Duration::from_secs(601));
        let r = reconciler(&h, ReconcileConfig::eager());
        r.reconcile_pending_payments().await.unwrap();

        let row = h.engine.store().payment(payment.id).unwrap().unwrap();
        assert_eq!(row.status, PaymentStatus::Expired);
        assert_eq!(h.engine.credits(&wallet).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_loop_stops_on_shutdown() {
        let h = harness();
        let r = Arc::new(reconciler(&h, ReconcileConfig::eager()));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(Arc::clone(&r).run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
