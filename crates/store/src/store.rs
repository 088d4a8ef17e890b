//! The storage trait.

use crate::StoreError;
use mintline_types::{
    Collection, CollectionId, InventoryItem, ItemId, MintPhase, MintRecord, MintRecordId,
    PaymentId, PendingPayment, PhaseId, Reservation, ReservationId, WalletAddress, Whitelist,
    WhitelistEntry, WhitelistId,
};

/// Durable row storage for every engine entity.
///
/// All methods are synchronous; callers that need atomicity across rows hold
/// the engine's per-collection lock around the whole read-decide-write span.
/// `put_*` methods are upserts keyed by the entity's id.
pub trait Store: Send + Sync {
    // --- Collections ---

    /// Upsert a collection.
    fn put_collection(&self, collection: &Collection) -> Result<(), StoreError>;

    /// Fetch a collection by id.
    fn collection(&self, id: CollectionId) -> Result<Option<Collection>, StoreError>;

    /// All collections.
    fn collections(&self) -> Result<Vec<Collection>, StoreError>;

    // --- Inventory items ---

    /// Upsert an inventory item.
    fn put_item(&self, item: &InventoryItem) -> Result<(), StoreError>;

    /// Fetch an item by id.
    fn item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError>;

    /// All items in a collection, ascending by sequence number.
    fn items_for_collection(&self, id: CollectionId) -> Result<Vec<InventoryItem>, StoreError>;

    // --- Phases ---

    /// Upsert a phase.
    fn put_phase(&self, phase: &MintPhase) -> Result<(), StoreError>;

    /// Fetch a phase by id.
    fn phase(&self, id: PhaseId) -> Result<Option<MintPhase>, StoreError>;

    /// All phases of a collection, ascending by position.
    fn phases_for_collection(&self, id: CollectionId) -> Result<Vec<MintPhase>, StoreError>;

    // --- Whitelists ---

    /// Upsert a whitelist.
    fn put_whitelist(&self, whitelist: &Whitelist) -> Result<(), StoreError>;

    /// Fetch a whitelist by id.
    fn whitelist(&self, id: WhitelistId) -> Result<Option<Whitelist>, StoreError>;

    /// Upsert a whitelist entry, keyed by (whitelist, wallet).
    fn put_whitelist_entry(&self, entry: &WhitelistEntry) -> Result<(), StoreError>;

    /// Fetch one wallet's entry in a whitelist.
    fn whitelist_entry(
        &self,
        whitelist: WhitelistId,
        wallet: &WalletAddress,
    ) -> Result<Option<WhitelistEntry>, StoreError>;

    /// All entries of a whitelist.
    fn entries_for_whitelist(&self, id: WhitelistId) -> Result<Vec<WhitelistEntry>, StoreError>;

    // --- Reservations ---

    /// Upsert a reservation.
    fn put_reservation(&self, reservation: &Reservation) -> Result<(), StoreError>;

    /// Fetch a reservation by id.
    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>, StoreError>;

    /// All reservations touching one item.
    fn reservations_for_item(&self, item: ItemId) -> Result<Vec<Reservation>, StoreError>;

    /// All reservations in a collection.
    fn reservations_for_collection(
        &self,
        id: CollectionId,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// All reservations still in `Reserved` status, across collections.
    /// Input to the expiry sweep.
    fn open_reservations(&self) -> Result<Vec<Reservation>, StoreError>;

    // --- Mint records ---

    /// Upsert a mint record, maintaining the reservation index.
    fn put_record(&self, record: &MintRecord) -> Result<(), StoreError>;

    /// Fetch a record by id.
    fn record(&self, id: MintRecordId) -> Result<Option<MintRecord>, StoreError>;

    /// Fetch the record correlated with a reservation, if any.
    fn record_for_reservation(
        &self,
        reservation: ReservationId,
    ) -> Result<Option<MintRecord>, StoreError>;

    /// All records not yet in a terminal state. Input to the poller.
    fn pending_records(&self) -> Result<Vec<MintRecord>, StoreError>;

    // --- Pending payments ---

    /// Upsert a pending payment.
    fn put_payment(&self, payment: &PendingPayment) -> Result<(), StoreError>;

    /// Fetch a payment by id.
    fn payment(&self, id: PaymentId) -> Result<Option<PendingPayment>, StoreError>;

    /// All payments still pending. Input to the payment reconciler.
    fn pending_payments(&self) -> Result<Vec<PendingPayment>, StoreError>;

    // --- Credits ledger ---

    /// Add credits to a wallet's balance, returning the new balance.
    fn add_credits(&self, wallet: &WalletAddress, credits: u64) -> Result<u64, StoreError>;

    /// A wallet's credit balance.
    fn credits(&self, wallet: &WalletAddress) -> Result<u64, StoreError>;

    // --- Admin wallets ---

    /// Grant admin rights to a wallet.
    fn put_admin(&self, wallet: &WalletAddress) -> Result<(), StoreError>;

    /// Whether a wallet has admin rights.
    fn is_admin(&self, wallet: &WalletAddress) -> Result<bool, StoreError>;

    /// All admin wallets.
    fn admin_wallets(&self) -> Result<Vec<WalletAddress>, StoreError>;
}
