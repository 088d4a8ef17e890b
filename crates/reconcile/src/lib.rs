//! Chain reconciliation for the Mintline allocation engine.
//!
//! The engine broadcasts transactions and forgets; this crate owns the
//! other half of the contract, polling chain state on an interval and
//! folding the answers back through the engine's idempotent transition
//! entry points. It also drives the reservation expiry sweep and the
//! pending-payment ledger.

mod config;
mod reconciler;

pub use config::ReconcileConfig;
pub use reconciler::{ReconcileReport, Reconciler};
