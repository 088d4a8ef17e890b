//! Mint orchestration and inventory-reservation engine.
//!
//! The engine coordinates exactly one invariant - each inventory item is
//! fulfilled by exactly one buyer - across two chain transaction models and
//! many concurrent requests. It is built from:
//!
//! - the **phase scheduler** ([`schedule`]) - which sale phase is eligible now
//! - the **allocation guard + reservation manager** ([`Engine::reserve`],
//!   [`Engine::sweep_expired_reservations`]) - atomic limit checks, item
//!   holds, and symmetric rollback
//! - the **lifecycle drivers** ([`Engine::submit_commit`],
//!   [`Engine::submit_reveal`], [`Engine::submit_mint`]) - the commit/reveal
//!   and submit/confirm state machines
//! - record transition entry points ([`Engine::complete_record`],
//!   [`Engine::fail_record`], ...) invoked by the reconciliation poller
//!
//! # Concurrency
//!
//! All allocation-affecting mutations (reservations, phase counters,
//! whitelist counters, item flags) happen behind a per-collection mutex, so
//! concurrent reservers cannot both pass the same capacity boundary. The
//! store only ever sees serialized single-row writes for these tables.
//! Chain I/O is async and never performed while a collection lock is held.

mod admin;
mod allocation;
mod commit_reveal;
mod config;
mod error;
mod locks;
mod payments;
mod records;
pub mod schedule;
mod status;
mod submit_confirm;

pub use admin::{PhaseSpec, PhaseStats};
pub use allocation::SweepReport;
pub use commit_reveal::RevealOutcome;
pub use config::EngineConfig;
pub use error::{AdminError, EngineError, ReserveError, SubmitError};
pub use status::StatusReport;

use locks::CollectionLocks;
use mintline_chain::{ChainClient, ContentEncoder, DelegatedSigner};
use mintline_store::Store;
use mintline_types::{ChainModel, Clock, WalletAddress};
use std::sync::Arc;

/// The mint orchestration engine.
///
/// Cheap to share: every public method takes `&self`.
pub struct Engine {
    store: Arc<dyn Store>,
    commit_reveal_chain: Arc<dyn ChainClient>,
    submit_confirm_chain: Arc<dyn ChainClient>,
    encoder: Arc<dyn ContentEncoder>,
    signer: Option<Arc<DelegatedSigner>>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    locks: CollectionLocks,
}

impl Engine {
    /// Create an engine.
    ///
    /// Seeds the stored admin set from `config.admin_seed` when, and only
    /// when, the stored set is empty; the static list is a bootstrap value,
    /// not an authority.
    pub fn new(
        store: Arc<dyn Store>,
        commit_reveal_chain: Arc<dyn ChainClient>,
        submit_confirm_chain: Arc<dyn ChainClient>,
        encoder: Arc<dyn ContentEncoder>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let engine = Self {
            store,
            commit_reveal_chain,
            submit_confirm_chain,
            encoder,
            signer: None,
            clock,
            config,
            locks: CollectionLocks::default(),
        };
        engine.seed_admins()?;
        Ok(engine)
    }

    /// Enable the delegated-signer guard on the submit/confirm path.
    pub fn with_signer(mut self, signer: Arc<DelegatedSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// The clock the engine reads time through.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn seed_admins(&self) -> Result<(), EngineError> {
        if !self.store.admin_wallets()?.is_empty() {
            return Ok(());
        }
        for wallet in &self.config.admin_seed {
            self.store.put_admin(wallet)?;
        }
        Ok(())
    }

    /// Whether a wallet has back-office rights.
    pub fn is_admin(&self, wallet: &WalletAddress) -> Result<bool, EngineError> {
        Ok(self.store.is_admin(wallet)?)
    }

    /// Grant back-office rights to a wallet.
    pub fn grant_admin(&self, wallet: &WalletAddress) -> Result<(), EngineError> {
        Ok(self.store.put_admin(wallet)?)
    }

    fn chain_for(&self, model: ChainModel) -> &Arc<dyn ChainClient> {
        match model {
            ChainModel::CommitReveal => &self.commit_reveal_chain,
            ChainModel::SubmitConfirm => &self.submit_confirm_chain,
        }
    }
}
