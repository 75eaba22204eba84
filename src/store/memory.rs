use crate::error::{Error, Result};
use crate::page::{IndexId, PageIndex};
use crate::store::IndexStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Process-local index store
#[derive(Debug, Default)]
pub struct MemoryStore {
    indexes: RwLock<HashMap<IndexId, PageIndex>>,
    fail_persist: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following persist call fail (or succeed again)
    pub fn fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    /// Store an index directly, bypassing failure injection
    pub async fn insert(&self, index: PageIndex) {
        self.indexes.write().await.insert(index.id, index);
    }

    /// Number of stored indexes
    pub async fn len(&self) -> usize {
        self.indexes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.indexes.read().await.is_empty()
    }
}

impl IndexStore for MemoryStore {
    async fn load(&self, id: IndexId) -> Result<Option<PageIndex>> {
        Ok(self.indexes.read().await.get(&id).cloned())
    }

    async fn persist(&self, index: &PageIndex) -> Result<()> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(Error::persistence(
                format!("saving index {}", index.id),
                "memory store is failing writes",
            ));
        }
        self.indexes.write().await.insert(index.id, index.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_then_load() {
        let store = MemoryStore::new();
        let mut index = store.create();
        index.upsert("/#!a", "a".to_string());

        assert!(store.load(index.id).await.unwrap().is_none());
        store.persist(&index).await.unwrap();
        assert_eq!(store.load(index.id).await.unwrap(), Some(index));
    }

    #[tokio::test]
    async fn test_failing_persist_leaves_store_untouched() {
        let store = MemoryStore::new();
        let index = store.create();
        store.fail_persist(true);

        let err = store.persist(&index).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(store.is_empty().await);
    }
}
