//! Process-local document store used in degraded deployments and in tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::dao::{
    document_store::{CollectionPath, Document, DocumentStore, SnapshotStream, merge_json},
    storage::{StorageError, StorageResult},
};

#[derive(Debug, Error)]
#[error("in-memory document store is offline")]
struct Offline;

struct Collection {
    docs: IndexMap<String, Value>,
    changes: watch::Sender<u64>,
}

impl Default for Collection {
    fn default() -> Self {
        let (changes, _rx) = watch::channel(0);
        Self {
            docs: IndexMap::new(),
            changes,
        }
    }
}

#[derive(Default)]
struct Inner {
    collections: DashMap<String, Collection>,
    offline: AtomicBool,
}

/// Document store keeping every collection in memory, preserving insertion order.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) connectivity: every operation fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "in-memory store offline".into(),
                Offline,
            ))
        } else {
            Ok(())
        }
    }

    fn watch(&self, key: &str) -> watch::Receiver<u64> {
        self.inner
            .collections
            .entry(key.to_string())
            .or_default()
            .changes
            .subscribe()
    }

    fn snapshot(&self, key: &str) -> StorageResult<Vec<Document>> {
        self.ensure_online()?;
        Ok(self
            .inner
            .collections
            .get(key)
            .map(|collection| {
                collection
                    .docs
                    .iter()
                    .map(|(id, body)| Document {
                        id: id.clone(),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert(&self, key: &str, body: Value) -> StorageResult<String> {
        self.ensure_online()?;
        let id = Uuid::new_v4().simple().to_string();
        let mut collection = self.inner.collections.entry(key.to_string()).or_default();
        collection.docs.insert(id.clone(), body);
        collection.changes.send_modify(|version| *version += 1);
        Ok(id)
    }

    fn merge(&self, key: &str, id: &str, patch: Value) -> StorageResult<()> {
        self.ensure_online()?;
        let mut collection = self
            .inner
            .collections
            .get_mut(key)
            .ok_or_else(|| StorageError::not_found(key, id))?;
        let target = collection
            .docs
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found(key, id))?;
        merge_json(target, patch);
        collection.changes.send_modify(|version| *version += 1);
        Ok(())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get_all(&self, collection: &CollectionPath) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let result = self.snapshot(collection.as_str());
        Box::pin(async move { result })
    }

    fn subscribe(&self, collection: &CollectionPath) -> SnapshotStream {
        let store = self.clone();
        let key = collection.to_string();
        Box::pin(async_stream::stream! {
            let mut changes = store.watch(&key);
            loop {
                yield store.snapshot(&key);
                if changes.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn add(&self, collection: &CollectionPath, body: Value) -> BoxFuture<'static, StorageResult<String>> {
        let result = self.insert(collection.as_str(), body);
        Box::pin(async move { result })
    }

    fn merge_set(
        &self,
        collection: &CollectionPath,
        id: &str,
        patch: Value,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.merge(collection.as_str(), id, patch);
        Box::pin(async move { result })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.ensure_online();
        Box::pin(async move { result })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde_json::json;

    use super::*;
    use crate::dao::document_store::OrderBy;

    fn games() -> CollectionPath {
        CollectionPath::games("test")
    }

    #[tokio::test]
    async fn add_then_get_all_preserves_order() {
        let store = MemoryDocumentStore::new();
        let first = store.add(&games(), json!({"name": "a"})).await.unwrap();
        let second = store.add(&games(), json!({"name": "b"})).await.unwrap();
        assert_ne!(first, second);

        let docs = store.get_all(&games()).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, [first, second]);
    }

    #[tokio::test]
    async fn subscribe_yields_initial_and_changed_snapshots() {
        let store = MemoryDocumentStore::new();
        let mut stream = store.subscribe(&games());

        let initial = stream.next().await.unwrap().unwrap();
        assert!(initial.is_empty());

        store.add(&games(), json!({"name": "a"})).await.unwrap();
        let next = stream.next().await.unwrap().unwrap();
        assert_eq!(next.len(), 1);
    }

    #[tokio::test]
    async fn merge_set_unknown_id_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store
            .merge_set(&games(), "missing", json!({"url": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn merge_set_updates_only_given_fields() {
        let store = MemoryDocumentStore::new();
        let id = store
            .add(&games(), json!({"name": "2048", "url": "old"}))
            .await
            .unwrap();
        store
            .merge_set(&games(), &id, json!({"url": "new"}))
            .await
            .unwrap();
        let docs = store.get_all(&games()).await.unwrap();
        assert_eq!(docs[0].body, json!({"name": "2048", "url": "new"}));
    }

    #[tokio::test]
    async fn query_orders_and_limits() {
        let store = MemoryDocumentStore::new();
        let board = CollectionPath::leaderboard("test");
        for score in [5, 50, 20, 40] {
            store.add(&board, json!({"score": score})).await.unwrap();
        }
        let mut stream = store.query(&board, OrderBy::desc("score"), 2);
        let top = stream.next().await.unwrap().unwrap();
        let scores: Vec<_> = top.iter().map(|d| d.body["score"].as_i64().unwrap()).collect();
        assert_eq!(scores, [50, 40]);
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryDocumentStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.health_check().await,
            Err(StorageError::Unavailable { .. })
        ));
        assert!(store.add(&games(), json!({})).await.is_err());
        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }
}
