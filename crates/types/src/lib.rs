//! Core types for the Mintline allocation engine.
//!
//! Every entity that the engine persists lives here: collections, inventory
//! items, sale phases, whitelists, reservations, mint records, and pending
//! payments. All types are plain serde-serializable data; the crates that
//! mutate them (`mintline-engine`, `mintline-reconcile`) hold the invariants.

mod chain;
mod clock;
mod collection;
mod errors;
mod identifiers;
mod payment;
mod phase;
mod record;
mod reservation;
mod time;
mod whitelist;

pub use chain::{ChainModel, TxStatusReport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{Amount, Collection, ContentId, ContentRef, InventoryItem};
pub use errors::AllocationError;
pub use identifiers::{
    CollectionId, ItemId, MintRecordId, PaymentId, PhaseId, ReservationId, TxId, WalletAddress,
    WhitelistId,
};
pub use payment::{PaymentStatus, PendingPayment};
pub use phase::{MintPhase, PhaseStatus, PhaseTransitionError};
pub use record::{
    CommitOutput, CommitRevealState, CommitRevealStatus, Lifecycle, MintRecord, SubmitConfirmState,
    SubmitConfirmStatus,
};
pub use reservation::{Reservation, ReservationStatus};
pub use time::Timestamp;
pub use whitelist::{Whitelist, WhitelistEntry};
