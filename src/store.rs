//! Persistence collaborator seam.
//!
//! The core never persists anything itself; account, instance, and password
//! records cross this trait as already-encrypted values (see [`crate::crypto`]).
//! Plaintext must never reach an implementation.
//!
//! Known gap, deliberately left open: the core gives no transactional
//! guarantee between a successful token verification and a later store
//! write. A second request for the same resource can interleave between the
//! two because the store calls suspend; closing that race (for example with
//! an optimistic concurrency token on the record) is an implementation
//! choice for the collaborator.

use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::Mutex;

/// Document-store operations the surrounding service must provide, keyed by
/// opaque collection names and record identifiers.
pub trait RecordStore: Send + Sync {
    fn find_one(
        &self,
        collection: &str,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Value>>> + Send;

    fn insert_one(
        &self,
        collection: &str,
        id: &str,
        record: Value,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Returns whether a record was found and updated.
    fn update_one(
        &self,
        collection: &str,
        id: &str,
        record: Value,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Returns whether a record was found and deleted.
    fn delete_one(
        &self,
        collection: &str,
        id: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Returns the number of records deleted.
    fn delete_many(
        &self,
        collection: &str,
        ids: &[String],
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}

/// In-memory [`RecordStore`] for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    async fn find_one(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let records = self.records.lock().await;
        Ok(records
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn insert_one(&self, collection: &str, id: &str, record: Value) -> Result<()> {
        let mut records = self.records.lock().await;
        records.insert((collection.to_string(), id.to_string()), record);
        Ok(())
    }

    async fn update_one(&self, collection: &str, id: &str, record: Value) -> Result<bool> {
        let mut records = self.records.lock().await;
        let key = (collection.to_string(), id.to_string());
        if records.contains_key(&key) {
            records.insert(key, record);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<bool> {
        let mut records = self.records.lock().await;
        Ok(records
            .remove(&(collection.to_string(), id.to_string()))
            .is_some())
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<u64> {
        let mut records = self.records.lock().await;
        let mut deleted = 0;
        for id in ids {
            if records
                .remove(&(collection.to_string(), id.clone()))
                .is_some()
            {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_round_trips_encrypted_records() {
        let store = MemoryStore::new();
        let record = json!({"email": "<envelope>", "settings": "<envelope>"});

        store
            .insert_one("accounts", "acct-1", record.clone())
            .await
            .unwrap();
        let found = store.find_one("accounts", "acct-1").await.unwrap();
        assert_eq!(found, Some(record));

        assert!(store
            .update_one("accounts", "acct-1", json!({"email": "<envelope2>"}))
            .await
            .unwrap());
        assert!(!store
            .update_one("accounts", "missing", json!({}))
            .await
            .unwrap());

        assert!(store.delete_one("accounts", "acct-1").await.unwrap());
        assert_eq!(store.find_one("accounts", "acct-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_many_counts_removed_records() {
        let store = MemoryStore::new();
        for id in ["a", "b", "c"] {
            store.insert_one("instances", id, json!({})).await.unwrap();
        }
        let ids = vec!["a".to_string(), "missing".to_string(), "c".to_string()];
        assert_eq!(store.delete_many("instances", &ids).await.unwrap(), 2);
    }
}
