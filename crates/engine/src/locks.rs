//! Per-collection lock table.

use mintline_types::CollectionId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// One mutex per collection.
///
/// The inventory table and the phase counters are the only hot shared
/// resources; serializing per collection keeps unrelated drops independent
/// while making each allocation decision atomic with its effects.
#[derive(Default)]
pub(crate) struct CollectionLocks {
    map: Mutex<HashMap<CollectionId, Arc<Mutex<()>>>>,
}

impl CollectionLocks {
    /// Get (or create) the lock for a collection.
    pub fn for_collection(&self, id: CollectionId) -> Arc<Mutex<()>> {
        self.map.lock().entry(id).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_collection_same_lock() {
        let locks = CollectionLocks::default();
        let a = locks.for_collection(CollectionId(1));
        let b = locks.for_collection(CollectionId(1));
        let c = locks.for_collection(CollectionId(2));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
