//! Production wiring for the Mintline allocation engine.
//!
//! Builds the store, chain clients, engine, and reconciler from a
//! [`RunnerConfig`] and runs them until shutdown. The `mintlined` binary is
//! a thin CLI over [`serve`].

mod config;

pub use config::{
    ChainsSection, EngineSection, ReconcileSection, RunnerConfig, SignerSection, StoreSection,
};

use anyhow::Context;
use mintline_chain::{DelegatedSigner, HttpChainClient, HttpContentEncoder};
use mintline_engine::Engine;
use mintline_reconcile::Reconciler;
use mintline_store::{RocksDbStore, Store};
use mintline_types::{Clock, SystemClock};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

fn load_signer(section: &SignerSection) -> anyhow::Result<Arc<DelegatedSigner>> {
    let bytes = hex::decode(section.seed_hex.trim()).context("signer seed is not valid hex")?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("signer seed must be exactly 32 bytes"))?;
    Ok(Arc::new(DelegatedSigner::from_seed(&seed)))
}

/// Build the full service from configuration.
pub fn build_engine(config: &RunnerConfig) -> anyhow::Result<Arc<Engine>> {
    let store = RocksDbStore::open(&config.store.path)
        .with_context(|| format!("opening store at {}", config.store.path.display()))?;
    let commit_reveal = HttpChainClient::new(&config.chains.commit_reveal_endpoint)?;
    let submit_confirm = HttpChainClient::new(&config.chains.submit_confirm_endpoint)?;
    let encoder = HttpContentEncoder::new(&config.chains.encoder_endpoint)?;

    let mut engine = Engine::new(
        Arc::new(store) as Arc<dyn Store>,
        Arc::new(commit_reveal) as _,
        Arc::new(submit_confirm) as _,
        Arc::new(encoder) as _,
        Arc::new(SystemClock) as Arc<dyn Clock>,
        config.engine_config(),
    )?;
    if let Some(signer) = &config.signer {
        engine = engine.with_signer(load_signer(signer)?);
        info!("delegated-signer guard enabled");
    }
    Ok(Arc::new(engine))
}

/// Run the daemon until interrupted.
pub async fn serve(config: RunnerConfig) -> anyhow::Result<()> {
    let engine = build_engine(&config)?;

    let commit_reveal = Arc::new(HttpChainClient::new(&config.chains.commit_reveal_endpoint)?);
    let submit_confirm = Arc::new(HttpChainClient::new(&config.chains.submit_confirm_endpoint)?);
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&engine),
        commit_reveal as _,
        submit_confirm as _,
        config.reconcile_config(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = tokio::spawn(Arc::clone(&reconciler).run(shutdown_rx));

    info!(store = %config.store.path.display(), "mintlined running");
    tokio::signal::ctrl_c()
        .await
        .context("listening for shutdown signal")?;
    info!("shutdown signal received");

    let _ = shutdown_tx.send(true);
    poller.await.context("reconciler task panicked")?;
    Ok(())
}
