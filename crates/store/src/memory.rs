//! In-memory store for tests and simulation.

use crate::{Store, StoreError};
use mintline_types::{
    Collection, CollectionId, InventoryItem, ItemId, MintPhase, MintRecord, MintRecordId,
    PaymentId, PendingPayment, PhaseId, Reservation, ReservationId, ReservationStatus,
    WalletAddress, Whitelist, WhitelistEntry, WhitelistId,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct Inner {
    collections: BTreeMap<CollectionId, Collection>,
    // BTreeMap keyed by ItemId gives (collection, sequence) iteration order.
    items: BTreeMap<ItemId, InventoryItem>,
    phases: HashMap<PhaseId, MintPhase>,
    whitelists: HashMap<WhitelistId, Whitelist>,
    whitelist_entries: HashMap<(WhitelistId, WalletAddress), WhitelistEntry>,
    reservations: HashMap<ReservationId, Reservation>,
    records: HashMap<MintRecordId, MintRecord>,
    records_by_reservation: HashMap<ReservationId, MintRecordId>,
    payments: HashMap<PaymentId, PendingPayment>,
    credits: HashMap<WalletAddress, u64>,
    admins: BTreeMap<WalletAddress, ()>,
}

/// In-memory [`Store`] backed by a single `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn put_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        self.inner
            .write()
            .collections
            .insert(collection.id, collection.clone());
        Ok(())
    }

    fn collection(&self, id: CollectionId) -> Result<Option<Collection>, StoreError> {
        Ok(self.inner.read().collections.get(&id).cloned())
    }

    fn collections(&self) -> Result<Vec<Collection>, StoreError> {
        Ok(self.inner.read().collections.values().cloned().collect())
    }

    fn put_item(&self, item: &InventoryItem) -> Result<(), StoreError> {
        self.inner.write().items.insert(item.id, item.clone());
        Ok(())
    }

    fn item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        Ok(self.inner.read().items.get(&id).cloned())
    }

    fn items_for_collection(&self, id: CollectionId) -> Result<Vec<InventoryItem>, StoreError> {
        let lo = ItemId::new(id, 0);
        let hi = ItemId::new(id, u32::MAX);
        Ok(self
            .inner
            .read()
            .items
            .range(lo..=hi)
            .map(|(_, item)| item.clone())
            .collect())
    }

    fn put_phase(&self, phase: &MintPhase) -> Result<(), StoreError> {
        self.inner.write().phases.insert(phase.id, phase.clone());
        Ok(())
    }

    fn phase(&self, id: PhaseId) -> Result<Option<MintPhase>, StoreError> {
        Ok(self.inner.read().phases.get(&id).cloned())
    }

    fn phases_for_collection(&self, id: CollectionId) -> Result<Vec<MintPhase>, StoreError> {
        let mut phases: Vec<MintPhase> = self
            .inner
            .read()
            .phases
            .values()
            .filter(|p| p.collection == id)
            .cloned()
            .collect();
        phases.sort_by_key(|p| p.position);
        Ok(phases)
    }

    fn put_whitelist(&self, whitelist: &Whitelist) -> Result<(), StoreError> {
        self.inner
            .write()
            .whitelists
            .insert(whitelist.id, whitelist.clone());
        Ok(())
    }

    fn whitelist(&self, id: WhitelistId) -> Result<Option<Whitelist>, StoreError> {
        Ok(self.inner.read().whitelists.get(&id).cloned())
    }

    fn put_whitelist_entry(&self, entry: &WhitelistEntry) -> Result<(), StoreError> {
        self.inner
            .write()
            .whitelist_entries
            .insert((entry.whitelist, entry.wallet.clone()), entry.clone());
        Ok(())
    }

    fn whitelist_entry(
        &self,
        whitelist: WhitelistId,
        wallet: &WalletAddress,
    ) -> Result<Option<WhitelistEntry>, StoreError> {
        Ok(self
            .inner
            .read()
            .whitelist_entries
            .get(&(whitelist, wallet.clone()))
            .cloned())
    }

    fn entries_for_whitelist(&self, id: WhitelistId) -> Result<Vec<WhitelistEntry>, StoreError> {
        Ok(self
            .inner
            .read()
            .whitelist_entries
            .values()
            .filter(|e| e.whitelist == id)
            .cloned()
            .collect())
    }

    fn put_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        self.inner
            .write()
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>, StoreError> {
        Ok(self.inner.read().reservations.get(&id).cloned())
    }

    fn reservations_for_item(&self, item: ItemId) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .inner
            .read()
            .reservations
            .values()
            .filter(|r| r.item == item)
            .cloned()
            .collect())
    }

    fn reservations_for_collection(
        &self,
        id: CollectionId,
    ) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .inner
            .read()
            .reservations
            .values()
            .filter(|r| r.collection == id)
            .cloned()
            .collect())
    }

    fn open_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .inner
            .read()
            .reservations
            .values()
            .filter(|r| r.status == ReservationStatus::Reserved)
            .cloned()
            .collect())
    }

    fn put_record(&self, record: &MintRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        inner
            .records_by_reservation
            .insert(record.reservation, record.id);
        inner.records.insert(record.id, record.clone());
        Ok(())
    }

    fn record(&self, id: MintRecordId) -> Result<Option<MintRecord>, StoreError> {
        Ok(self.inner.read().records.get(&id).cloned())
    }

    fn record_for_reservation(
        &self,
        reservation: ReservationId,
    ) -> Result<Option<MintRecord>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .records_by_reservation
            .get(&reservation)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    fn pending_records(&self) -> Result<Vec<MintRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .records
            .values()
            .filter(|r| !r.is_terminal())
            .cloned()
            .collect())
    }

    fn put_payment(&self, payment: &PendingPayment) -> Result<(), StoreError> {
        self.inner
            .write()
            .payments
            .insert(payment.id, payment.clone());
        Ok(())
    }

    fn payment(&self, id: PaymentId) -> Result<Option<PendingPayment>, StoreError> {
        Ok(self.inner.read().payments.get(&id).cloned())
    }

    fn pending_payments(&self) -> Result<Vec<PendingPayment>, StoreError> {
        Ok(self
            .inner
            .read()
            .payments
            .values()
            .filter(|p| !p.is_terminal())
            .cloned()
            .collect())
    }

    fn add_credits(&self, wallet: &WalletAddress, credits: u64) -> Result<u64, StoreError> {
        let mut inner = self.inner.write();
        let balance = inner.credits.entry(wallet.clone()).or_insert(0);
        *balance = balance.saturating_add(credits);
        Ok(*balance)
    }

    fn credits(&self, wallet: &WalletAddress) -> Result<u64, StoreError> {
        Ok(self.inner.read().credits.get(wallet).copied().unwrap_or(0))
    }

    fn put_admin(&self, wallet: &WalletAddress) -> Result<(), StoreError> {
        self.inner.write().admins.insert(wallet.clone(), ());
        Ok(())
    }

    fn is_admin(&self, wallet: &WalletAddress) -> Result<bool, StoreError> {
        Ok(self.inner.read().admins.contains_key(wallet))
    }

    fn admin_wallets(&self) -> Result<Vec<WalletAddress>, StoreError> {
        Ok(self.inner.read().admins.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintline_types::{ChainModel, ContentRef, Timestamp};

    #[test]
    fn test_items_iterate_in_sequence_order() {
        let store = MemoryStore::new();
        let collection = CollectionId(1);
        let other = CollectionId(2);

        for seq in [5u32, 0, 3] {
            let item = InventoryItem::new(
                ItemId::new(collection, seq),
                ContentRef::new(format!("ipfs://x/{seq}"), "image/png"),
            );
            store.put_item(&item).unwrap();
        }
        store
            .put_item(&InventoryItem::new(
                ItemId::new(other, 1),
                ContentRef::new("ipfs://y/1", "image/png"),
            ))
            .unwrap();

        let items = store.items_for_collection(collection).unwrap();
        let seqs: Vec<u32> = items.iter().map(|i| i.sequence()).collect();
        assert_eq!(seqs, vec![0, 3, 5]);
    }

    #[test]
    fn test_record_index_follows_reservation() {
        let store = MemoryStore::new();
        let reservation = ReservationId::generate();
        assert!(store.record_for_reservation(reservation).unwrap().is_none());
    }

    #[test]
    fn test_credits_are_additive() {
        let store = MemoryStore::new();
        let wallet = WalletAddress::new("w1");
        assert_eq!(store.credits(&wallet).unwrap(), 0);
        assert_eq!(store.add_credits(&wallet, 10).unwrap(), 10);
        assert_eq!(store.add_credits(&wallet, 5).unwrap(), 15);
        assert_eq!(store.credits(&wallet).unwrap(), 15);
    }

    #[test]
    fn test_admin_wallets() {
        let store = MemoryStore::new();
        let wallet = WalletAddress::new("admin1");
        assert!(!store.is_admin(&wallet).unwrap());
        store.put_admin(&wallet).unwrap();
        assert!(store.is_admin(&wallet).unwrap());
        assert_eq!(store.admin_wallets().unwrap(), vec![wallet]);
    }

    #[test]
    fn test_collection_round_trip() {
        let store = MemoryStore::new();
        let collection = Collection {
            id: CollectionId(9),
            name: "drop".into(),
            model: ChainModel::CommitReveal,
            created_at: Timestamp::from_millis(1),
        };
        store.put_collection(&collection).unwrap();
        assert_eq!(store.collection(CollectionId(9)).unwrap(), Some(collection));
    }
}
