use std::collections::HashMap;

use archstats_core::{SnapshotStore, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

/// In-memory snapshot store, keyed by index.
#[derive(Default)]
pub struct MemSnapshotStore {
    map: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed an index so `exists` answers true, for tests that need a
    /// prior document to be present.
    pub async fn seed(&self, index: &str, document: Value) {
        let mut map = self.map.write().await;
        map.entry(index.to_string()).or_default().push(document);
    }

    /// Number of documents stored under `index`.
    pub async fn count(&self, index: &str) -> usize {
        let map = self.map.read().await;
        map.get(index).map(Vec::len).unwrap_or(0)
    }

    /// All documents stored under `index`, oldest first.
    pub async fn documents(&self, index: &str) -> Vec<Value> {
        let map = self.map.read().await;
        map.get(index).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl SnapshotStore for MemSnapshotStore {
    async fn exists(&self, index: &str) -> StoreResult<bool> {
        let map = self.map.read().await;
        Ok(map.get(index).is_some_and(|docs| !docs.is_empty()))
    }

    async fn store(&self, index: &str, document: &Value) -> StoreResult<()> {
        let mut map = self.map.write().await;
        map.entry(index.to_string())
            .or_default()
            .push(document.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn store_then_exists() {
        let store = MemSnapshotStore::new();
        assert!(!store.exists("idx").await.unwrap());

        store.store("idx", &json!({"a": 1})).await.unwrap();
        assert!(store.exists("idx").await.unwrap());
        assert_eq!(store.count("idx").await, 1);

        store.store("idx", &json!({"a": 2})).await.unwrap();
        assert_eq!(store.documents("idx").await.len(), 2);
    }

    #[tokio::test]
    async fn indexes_are_independent() {
        let store = MemSnapshotStore::new();
        store.store("a", &json!({})).await.unwrap();
        assert!(store.exists("a").await.unwrap());
        assert!(!store.exists("b").await.unwrap());
    }
}
