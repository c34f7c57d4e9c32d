//! Storage seam between the repository and a backing store.

use anyhow::Error;
use farmtrack_store_json::{Collection, JsonStore, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

/// Minimal storage abstraction required by [`crate::repository::FarmRepository`].
pub trait RecordStore {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error>;

    /// Load every raw record of a collection.
    ///
    /// # Errors
    /// Returns a store-specific error when the collection cannot be read.
    fn load(&self, collection: Collection) -> Result<Vec<Value>, Self::Error>;

    /// Replace every raw record of a collection.
    ///
    /// # Errors
    /// Returns a store-specific error when the collection cannot be written.
    fn save(&self, collection: Collection, records: &[Value]) -> Result<(), Self::Error>;
}

impl RecordStore for JsonStore {
    type Error = StoreError;

    fn load(&self, collection: Collection) -> Result<Vec<Value>, Self::Error> {
        Self::load(self, collection)
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<(), Self::Error> {
        Self::save(self, collection, records)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    type Error = S::Error;

    fn load(&self, collection: Collection) -> Result<Vec<Value>, Self::Error> {
        (**self).load(collection)
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<(), Self::Error> {
        (**self).save(collection, records)
    }
}

/// In-process store, handy for tests and scratch sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one collection.
    #[must_use]
    pub fn with(self, collection: Collection, records: Vec<Value>) -> Self {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection, records);
        self
    }
}

impl RecordStore for MemoryStore {
    type Error = Infallible;

    fn load(&self, collection: Collection) -> Result<Vec<Value>, Self::Error> {
        Ok(self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<(), Self::Error> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection, records.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_replaces_collections() {
        let store = MemoryStore::new().with(Collection::Farms, vec![json!({"Id": 1})]);
        assert_eq!(store.load(Collection::Farms).map(|v| v.len()), Ok(1));
        assert_eq!(store.load(Collection::Crops).map(|v| v.len()), Ok(0));

        assert!(store.save(Collection::Farms, &[]).is_ok());
        assert_eq!(store.load(Collection::Farms).map(|v| v.len()), Ok(0));
    }

    #[test]
    fn shared_store_delegates() {
        let store = Arc::new(MemoryStore::new());
        let handle = Arc::clone(&store);
        assert!(handle.save(Collection::Tasks, &[json!({"Id": 7})]).is_ok());
        assert_eq!(store.load(Collection::Tasks).map(|v| v.len()), Ok(1));
    }
}
