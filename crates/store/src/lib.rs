//! Durable storage for the Mintline allocation engine.
//!
//! # Design
//!
//! The engine and the reconciliation poller may run in different processes,
//! so no in-memory-only state survives a restart: every reservation, mint
//! record, and phase counter is reconstructable purely from stored rows.
//!
//! The [`Store`] trait is synchronous and repository-shaped. Two
//! implementations are provided:
//!
//! - [`MemoryStore`] - in-memory, for tests and simulation
//! - [`RocksDbStore`] - RocksDB column families, for production
//!
//! The store itself provides no cross-row atomicity; the engine serializes
//! every allocation-affecting mutation behind a per-collection lock, so the
//! store only needs durable single-row writes.

mod error;
mod memory;
mod rocks;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use rocks::RocksDbStore;
pub use store::Store;
