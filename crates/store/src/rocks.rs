//! RocksDB-backed store for production.
//!
//! Each entity gets its own column family. Keys are big-endian id bytes so
//! iteration order matches id order; inventory items use a composite
//! `collection ++ sequence` key, which makes the lowest-sequence scan a
//! prefix iteration.

use crate::{Store, StoreError};
use mintline_types::{
    Collection, CollectionId, InventoryItem, ItemId, MintPhase, MintRecord, MintRecordId,
    PaymentId, PendingPayment, PhaseId, Reservation, ReservationId, ReservationStatus,
    WalletAddress, Whitelist, WhitelistEntry, WhitelistId,
};
use parking_lot::Mutex;
use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const CF_COLLECTIONS: &str = "collections";
const CF_ITEMS: &str = "items";
const CF_PHASES: &str = "phases";
const CF_WHITELISTS: &str = "whitelists";
const CF_WHITELIST_ENTRIES: &str = "whitelist_entries";
const CF_RESERVATIONS: &str = "reservations";
const CF_RECORDS: &str = "records";
const CF_RECORDS_BY_RESERVATION: &str = "records_by_reservation";
const CF_PAYMENTS: &str = "payments";
const CF_CREDITS: &str = "credits";
const CF_ADMINS: &str = "admins";

const ALL_CFS: &[&str] = &[
    CF_COLLECTIONS,
    CF_ITEMS,
    CF_PHASES,
    CF_WHITELISTS,
    CF_WHITELIST_ENTRIES,
    CF_RESERVATIONS,
    CF_RECORDS,
    CF_RECORDS_BY_RESERVATION,
    CF_PAYMENTS,
    CF_CREDITS,
    CF_ADMINS,
];

/// Key encoding helpers shared by the column families.
mod keys {
    use mintline_types::{ItemId, WhitelistId};
    use mintline_types::WalletAddress;

    pub fn u64_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    pub fn u128_key(id: u128) -> [u8; 16] {
        id.to_be_bytes()
    }

    pub fn item_key(id: ItemId) -> [u8; 12] {
        let mut key = [0u8; 12];
        key[..8].copy_from_slice(&id.collection.0.to_be_bytes());
        key[8..].copy_from_slice(&id.sequence.to_be_bytes());
        key
    }

    pub fn whitelist_entry_key(whitelist: WhitelistId, wallet: &WalletAddress) -> Vec<u8> {
        let mut key = Vec::with_capacity(8 + wallet.as_str().len());
        key.extend_from_slice(&whitelist.0.to_be_bytes());
        key.extend_from_slice(wallet.as_str().as_bytes());
        key
    }
}

/// RocksDB-backed [`Store`].
pub struct RocksDbStore {
    db: DB,
    // Serializes the read-modify-write in `add_credits`; everything else is
    // single-row and already serialized by the engine's collection locks.
    credits_lock: Mutex<()>,
}

impl RocksDbStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        let db = DB::open_cf(&opts, path, ALL_CFS)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            db,
            credits_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family {name}")))
    }

    fn put_json<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.db
            .put_cf(self.cf(cf)?, key, bytes)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        cf: &str,
        key: &[u8],
    ) -> Result<Option<T>, StoreError> {
        let bytes = self
            .db
            .get_cf(self.cf(cf)?, key)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_json<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        for entry in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_, value) = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }
}

impl Store for RocksDbStore {
    fn put_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        self.put_json(CF_COLLECTIONS, &keys::u64_key(collection.id.0), collection)
    }

    fn collection(&self, id: CollectionId) -> Result<Option<Collection>, StoreError> {
        self.get_json(CF_COLLECTIONS, &keys::u64_key(id.0))
    }

    fn collections(&self) -> Result<Vec<Collection>, StoreError> {
        self.scan_json(CF_COLLECTIONS)
    }

    fn put_item(&self, item: &InventoryItem) -> Result<(), StoreError> {
        self.put_json(CF_ITEMS, &keys::item_key(item.id), item)
    }

    fn item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        self.get_json(CF_ITEMS, &keys::item_key(id))
    }

    fn items_for_collection(&self, id: CollectionId) -> Result<Vec<InventoryItem>, StoreError> {
        let prefix = keys::u64_key(id.0);
        let mode = IteratorMode::From(&prefix, Direction::Forward);
        let mut out = Vec::new();
        for entry in self.db.iterator_cf(self.cf(CF_ITEMS)?, mode) {
            let (key, value) = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    fn put_phase(&self, phase: &MintPhase) -> Result<(), StoreError> {
        self.put_json(CF_PHASES, &keys::u64_key(phase.id.0), phase)
    }

    fn phase(&self, id: PhaseId) -> Result<Option<MintPhase>, StoreError> {
        self.get_json(CF_PHASES, &keys::u64_key(id.0))
    }

    fn phases_for_collection(&self, id: CollectionId) -> Result<Vec<MintPhase>, StoreError> {
        let mut phases: Vec<MintPhase> = self
            .scan_json::<MintPhase>(CF_PHASES)?
            .into_iter()
            .filter(|p| p.collection == id)
            .collect();
        phases.sort_by_key(|p| p.position);
        Ok(phases)
    }

    fn put_whitelist(&self, whitelist: &Whitelist) -> Result<(), StoreError> {
        self.put_json(CF_WHITELISTS, &keys::u64_key(whitelist.id.0), whitelist)
    }

    fn whitelist(&self, id: WhitelistId) -> Result<Option<Whitelist>, StoreError> {
        self.get_json(CF_WHITELISTS, &keys::u64_key(id.0))
    }

    fn put_whitelist_entry(&self, entry: &WhitelistEntry) -> Result<(), StoreError> {
        let key = keys::whitelist_entry_key(entry.whitelist, &entry.wallet);
        self.put_json(CF_WHITELIST_ENTRIES, &key, entry)
    }

    fn whitelist_entry(
        &self,
        whitelist: WhitelistId,
        wallet: &WalletAddress,
    ) -> Result<Option<WhitelistEntry>, StoreError> {
        let key = keys::whitelist_entry_key(whitelist, wallet);
        self.get_json(CF_WHITELIST_ENTRIES, &key)
    }

    fn entries_for_whitelist(&self, id: WhitelistId) -> Result<Vec<WhitelistEntry>, StoreError> {
        let prefix = keys::u64_key(id.0);
        let mode = IteratorMode::From(&prefix, Direction::Forward);
        let mut out = Vec::new();
        for entry in self.db.iterator_cf(self.cf(CF_WHITELIST_ENTRIES)?, mode) {
            let (key, value) = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    fn put_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        self.put_json(CF_RESERVATIONS, &keys::u128_key(reservation.id.0), reservation)
    }

    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>, StoreError> {
        self.get_json(CF_RESERVATIONS, &keys::u128_key(id.0))
    }

    fn reservations_for_item(&self, item: ItemId) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .scan_json::<Reservation>(CF_RESERVATIONS)?
            .into_iter()
            .filter(|r| r.item == item)
            .collect())
    }

    fn reservations_for_collection(
        &self,
        id: CollectionId,
    ) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .scan_json::<Reservation>(CF_RESERVATIONS)?
            .into_iter()
            .filter(|r| r.collection == id)
            .collect())
    }

    fn open_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .scan_json::<Reservation>(CF_RESERVATIONS)?
            .into_iter()
            .filter(|r| r.status == ReservationStatus::Reserved)
            .collect())
    }

    fn put_record(&self, record: &MintRecord) -> Result<(), StoreError> {
        self.put_json(CF_RECORDS, &keys::u128_key(record.id.0), record)?;
        self.db
            .put_cf(
                self.cf(CF_RECORDS_BY_RESERVATION)?,
                keys::u128_key(record.reservation.0),
                keys::u128_key(record.id.0),
            )
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn record(&self, id: MintRecordId) -> Result<Option<MintRecord>, StoreError> {
        self.get_json(CF_RECORDS, &keys::u128_key(id.0))
    }

    fn record_for_reservation(
        &self,
        reservation: ReservationId,
    ) -> Result<Option<MintRecord>, StoreError> {
        let index = self
            .db
            .get_cf(
                self.cf(CF_RECORDS_BY_RESERVATION)?,
                keys::u128_key(reservation.0),
            )
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match index {
            Some(id_bytes) if id_bytes.len() == 16 => {
                let mut arr = [0u8; 16];
                arr.copy_from_slice(&id_bytes);
                self.record(MintRecordId(u128::from_be_bytes(arr)))
            }
            Some(_) => Err(StoreError::Codec("malformed record index entry".into())),
            None => Ok(None),
        }
    }

    fn pending_records(&self) -> Result<Vec<MintRecord>, StoreError> {
        Ok(self
            .scan_json::<MintRecord>(CF_RECORDS)?
            .into_iter()
            .filter(|r| !r.is_terminal())
            .collect())
    }

    fn put_payment(&self, payment: &PendingPayment) -> Result<(), StoreError> {
        self.put_json(CF_PAYMENTS, &keys::u128_key(payment.id.0), payment)
    }

    fn payment(&self, id: PaymentId) -> Result<Option<PendingPayment>, StoreError> {
        self.get_json(CF_PAYMENTS, &keys::u128_key(id.0))
    }

    fn pending_payments(&self) -> Result<Vec<PendingPayment>, StoreError> {
        Ok(self
            .scan_json::<PendingPayment>(CF_PAYMENTS)?
            .into_iter()
            .filter(|p| !p.is_terminal())
            .collect())
    }

    fn add_credits(&self, wallet: &WalletAddress, credits: u64) -> Result<u64, StoreError> {
        let _guard = self.credits_lock.lock();
        let key = wallet.as_str().as_bytes();
        let cf = self.cf(CF_CREDITS)?;
        let current = self
            .db
            .get_cf(cf, key)
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .map(|bytes| {
                if bytes.len() == 8 {
                    let mut arr = [0u8; 8];
                    arr.copy_from_slice(&bytes);
                    Ok(u64::from_be_bytes(arr))
                } else {
                    Err(StoreError::Codec("malformed credit balance".into()))
                }
            })
            .transpose()?
            .unwrap_or(0);
        let balance = current.saturating_add(credits);
        self.db
            .put_cf(cf, key, balance.to_be_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(balance)
    }

    fn credits(&self, wallet: &WalletAddress) -> Result<u64, StoreError> {
        let bytes = self
            .db
            .get_cf(self.cf(CF_CREDITS)?, wallet.as_str().as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match bytes {
            Some(bytes) if bytes.len() == 8 => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                Ok(u64::from_be_bytes(arr))
            }
            Some(_) => Err(StoreError::Codec("malformed credit balance".into())),
            None => Ok(0),
        }
    }

    fn put_admin(&self, wallet: &WalletAddress) -> Result<(), StoreError> {
        self.db
            .put_cf(self.cf(CF_ADMINS)?, wallet.as_str().as_bytes(), [])
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn is_admin(&self, wallet: &WalletAddress) -> Result<bool, StoreError> {
        Ok(self
            .db
            .get_cf(self.cf(CF_ADMINS)?, wallet.as_str().as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .is_some())
    }

    fn admin_wallets(&self) -> Result<Vec<WalletAddress>, StoreError> {
        let mut out = Vec::new();
        for entry in self
            .db
            .iterator_cf(self.cf(CF_ADMINS)?, IteratorMode::Start)
        {
            let (key, _) = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
            let wallet = String::from_utf8(key.to_vec())
                .map_err(|_| StoreError::Codec("non-utf8 admin wallet key".into()))?;
            out.push(WalletAddress::new(wallet));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintline_types::{Amount, ChainModel, ContentRef, PhaseStatus, Timestamp};
    use tempfile::TempDir;

    fn open_store() -> (TempDir, RocksDbStore) {
        let dir = TempDir::new().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_item_prefix_scan_stays_in_collection() {
        let (_dir, store) = open_store();
        let a = CollectionId(1);
        let b = CollectionId(2);
        for seq in 0..3u32 {
            store
                .put_item(&InventoryItem::new(
                    ItemId::new(a, seq),
                    ContentRef::new(format!("ipfs://a/{seq}"), "image/png"),
                ))
                .unwrap();
        }
        store
            .put_item(&InventoryItem::new(
                ItemId::new(b, 0),
                ContentRef::new("ipfs://b/0", "image/png"),
            ))
            .unwrap();

        let items = store.items_for_collection(a).unwrap();
        assert_eq!(items.len(), 3);
        let seqs: Vec<u32> = items.iter().map(|i| i.sequence()).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn test_phase_round_trip_and_ordering() {
        let (_dir, store) = open_store();
        let collection = CollectionId(7);
        for (id, position) in [(3u64, 2u32), (1, 0), (2, 1)] {
            store
                .put_phase(&MintPhase {
                    id: PhaseId(id),
                    collection,
                    position,
                    start_time: Timestamp::from_millis(0),
                    end_time: None,
                    price: Amount(1),
                    fee_rate_min: None,
                    fee_rate_max: None,
                    max_per_wallet: None,
                    max_per_tx: None,
                    allocation: None,
                    minted_count: 0,
                    whitelist: None,
                    end_on_allocation: false,
                    status: PhaseStatus::Active,
                })
                .unwrap();
        }
        let phases = store.phases_for_collection(collection).unwrap();
        let positions: Vec<u32> = phases.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_credits_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let wallet = WalletAddress::new("w1");
        {
            let store = RocksDbStore::open(dir.path()).unwrap();
            store.add_credits(&wallet, 42).unwrap();
        }
        let store = RocksDbStore::open(dir.path()).unwrap();
        assert_eq!(store.credits(&wallet).unwrap(), 42);
    }

    #[test]
    fn test_collection_round_trip() {
        let (_dir, store) = open_store();
        let collection = Collection {
            id: CollectionId(5),
            name: "drop".into(),
            model: ChainModel::SubmitConfirm,
            created_at: Timestamp::from_millis(10),
        };
        store.put_collection(&collection).unwrap();
        assert_eq!(
            store.collection(CollectionId(5)).unwrap(),
            Some(collection)
        );
    }
}
