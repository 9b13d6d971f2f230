//! In-memory content store.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};
use crate::model::StoreRecord;
use crate::storage::Store;

/// Content store backed by an in-process map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, StoreRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = StoreRecord>) -> Self {
        let records = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Whether the store holds no records.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, StoreRecord>>> {
        self.records
            .read()
            .map_err(|_| Error::Store("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, StoreRecord>>> {
        self.records
            .write()
            .map_err(|_| Error::Store("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<StoreRecord>> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn set(&self, record: StoreRecord) -> Result<()> {
        self.write()?.insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.write()?.remove(id).is_some())
    }

    async fn ids(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;

    fn record(id: &str) -> StoreRecord {
        StoreRecord {
            id: id.to_string(),
            data: Metadata::new(),
            rendered: format!("<p>{id}</p>"),
            file_path: Some(format!("src/content/{id}.md")),
            digest: "d1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        store.set(record("a")).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(record("a")));
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_same_id() {
        let store = MemoryStore::new();
        store.set(record("a")).await.unwrap();

        let mut replacement = record("a");
        replacement.rendered = "<p>new</p>".into();
        store.set(replacement.clone()).await.unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get("a").await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn test_ids_sorted() {
        let store = MemoryStore::with_records([record("b"), record("a")]);
        assert_eq!(store.ids().await.unwrap(), vec!["a", "b"]);
    }
}
