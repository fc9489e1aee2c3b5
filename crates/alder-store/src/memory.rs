//! In-memory backing store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use alder_types::Vref;

use crate::error::StoreError;
use crate::traits::StateStore;

/// HashMap-backed store for tests and single-process runtimes.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    entries: RwLock<HashMap<Vref, Vec<u8>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.entries.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a payload without going through the async trait.
    ///
    /// Exists so tests can stage corrupted entries.
    pub fn insert_raw(&self, vref: Vref, bytes: Vec<u8>) {
        self.entries
            .write()
            .expect("store lock poisoned")
            .insert(vref, bytes);
    }

    /// Drop a payload without going through the async trait.
    pub fn remove_raw(&self, vref: &Vref) {
        self.entries
            .write()
            .expect("store lock poisoned")
            .remove(vref);
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn put(&self, vref: &Vref, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?
            .insert(vref.clone(), bytes);
        Ok(())
    }

    async fn get(&self, vref: &Vref) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?
            .get(vref)
            .cloned())
    }

    async fn delete(&self, vref: &Vref) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?
            .remove(vref);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_cycle() {
        let store = InMemoryStateStore::new();
        let vref = Vref::Import(1);

        assert_eq!(store.get(&vref).await.unwrap(), None);
        store.put(&vref, b"payload".to_vec()).await.unwrap();
        assert_eq!(store.get(&vref).await.unwrap(), Some(b"payload".to_vec()));
        assert!(store.contains(&vref).await.unwrap());

        store.delete(&vref).await.unwrap();
        assert_eq!(store.get(&vref).await.unwrap(), None);
        // deleting again stays a no-op
        store.delete(&vref).await.unwrap();
    }

    #[tokio::test]
    async fn put_replaces_previous_payload() {
        let store = InMemoryStateStore::new();
        let vref = Vref::Collection(0);
        store.put(&vref, b"old".to_vec()).await.unwrap();
        store.put(&vref, b"new".to_vec()).await.unwrap();
        assert_eq!(store.get(&vref).await.unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.len(), 1);
    }
}
