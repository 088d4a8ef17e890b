//! Shared fixtures for engine and reconciler tests.
//!
//! A [`Harness`] wires an [`Engine`] to in-memory storage, a scriptable
//! mock chain, and a manually-driven clock, so tests control time and chain
//! behavior completely.

use mintline_chain::{DelegatedSigner, MockChain, MockEncoder};
use mintline_engine::{Engine, EngineConfig, PhaseSpec};
use mintline_store::{MemoryStore, Store};
use mintline_types::{
    ChainModel, Collection, CollectionId, ContentRef, ManualClock, MintPhase, PhaseId,
    Reservation, ReservationId, Timestamp, WalletAddress, WhitelistId,
};
use std::sync::Arc;
use std::time::Duration;

/// Everything a test needs to drive the engine deterministically.
pub struct Harness {
    /// The engine under test.
    pub engine: Arc<Engine>,
    /// Backing store, for direct row inspection.
    pub store: Arc<MemoryStore>,
    /// Mock chain serving both transaction models.
    pub chain: Arc<MockChain>,
    /// Manually-driven clock; starts at one hour past epoch.
    pub clock: Arc<ManualClock>,
}

/// Time the harness clock starts at. Late enough that phases opening at
/// zero are inside their window.
pub const START: Timestamp = Timestamp(3_600_000);

/// Harness with the default engine configuration.
pub fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

/// Harness with a specific reservation TTL.
pub fn harness_with_ttl(ttl: Duration) -> Harness {
    harness_with(EngineConfig::default().with_reservation_ttl(ttl))
}

/// Harness with the delegated-signer guard enabled.
///
/// The signer seed is fixed, so tests can construct rogue keys that differ
/// from it.
pub fn harness_with_signer() -> Harness {
    build(
        EngineConfig::default(),
        Some(Arc::new(DelegatedSigner::from_seed(&[7u8; 32]))),
    )
}

/// Harness with a custom engine configuration.
pub fn harness_with(config: EngineConfig) -> Harness {
    build(config, None)
}

fn build(config: EngineConfig, signer: Option<Arc<DelegatedSigner>>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let chain = Arc::new(MockChain::new());
    let clock = Arc::new(ManualClock::new(START));
    let mut engine = Engine::new(
        Arc::clone(&store) as Arc<dyn Store>,
        Arc::clone(&chain) as _,
        Arc::clone(&chain) as _,
        Arc::new(MockEncoder::new()),
        Arc::clone(&clock) as _,
        config,
    )
    .expect("engine construction");
    if let Some(signer) = signer {
        engine = engine.with_signer(signer);
    }
    Harness {
        engine: Arc::new(engine),
        store,
        chain,
        clock,
    }
}

impl Harness {
    /// Create a collection with `n` sequentially-numbered items.
    pub fn seed_collection(&self, model: ChainModel, n: u32) -> Collection {
        let items = (0..n)
            .map(|i| ContentRef::new(format!("ipfs://fixture/{i}.png"), "image/png"))
            .collect();
        self.engine
            .create_collection("fixture", model, items)
            .expect("seed collection")
    }

    /// Add an immediately active, open-ended, uncapped phase.
    pub fn seed_open_phase(&self, collection: CollectionId) -> MintPhase {
        self.seed_phase(collection, |_| {})
    }

    /// Add a phase, customizing the open-phase defaults first.
    pub fn seed_phase(
        &self,
        collection: CollectionId,
        customize: impl FnOnce(&mut PhaseSpec),
    ) -> MintPhase {
        let mut spec = PhaseSpec::open(collection);
        customize(&mut spec);
        self.engine.add_phase(spec).expect("seed phase")
    }

    /// Create a whitelist with the given wallet allocations.
    pub fn seed_whitelist(&self, entries: &[(WalletAddress, u32)]) -> WhitelistId {
        self.engine
            .create_whitelist("fixture-wl", entries.to_vec())
            .expect("seed whitelist")
            .id
    }

    /// Fetch a phase row.
    pub fn phase(&self, id: PhaseId) -> MintPhase {
        self.store
            .phase(id)
            .expect("store read")
            .expect("phase exists")
    }

    /// Fetch a reservation row.
    pub fn reservation(&self, id: ReservationId) -> Reservation {
        self.store
            .reservation(id)
            .expect("store read")
            .expect("reservation exists")
    }
}
