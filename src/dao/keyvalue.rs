//! Opaque string key-value persistence used for per-player preferences.

use std::{io, path::PathBuf, sync::Arc};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Failures raised by key-value backends.
#[derive(Debug, Error)]
pub enum KeyValueError {
    #[error("failed to access key-value file `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode key-value file")]
    Serialize(#[source] serde_json::Error),
}

pub type KeyValueResult<T> = Result<T, KeyValueError>;

/// Minimal get/set string store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> BoxFuture<'static, KeyValueResult<Option<String>>>;
    fn set(&self, key: &str, value: String) -> BoxFuture<'static, KeyValueResult<()>>;
}

/// Volatile store used when no preferences file is configured.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> BoxFuture<'static, KeyValueResult<Option<String>>> {
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, KeyValueResult<()>> {
        self.entries.insert(key.to_string(), value);
        Box::pin(async { Ok(()) })
    }
}

/// Store persisted as a single JSON object on disk, rewritten on every `set`.
#[derive(Clone)]
pub struct FileKeyValueStore {
    path: Arc<PathBuf>,
    entries: Arc<RwLock<IndexMap<String, String>>>,
}

impl FileKeyValueStore {
    /// Open the store, starting empty when the file is missing or unreadable.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<IndexMap<String, String>>(&contents) {
                Ok(entries) => {
                    info!(path = %path.display(), count = entries.len(), "loaded preferences file");
                    entries
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to parse preferences file; starting empty");
                    IndexMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => IndexMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read preferences file; starting empty");
                IndexMap::new()
            }
        };

        Self {
            path: Arc::new(path),
            entries: Arc::new(RwLock::new(entries)),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> BoxFuture<'static, KeyValueResult<Option<String>>> {
        let entries = self.entries.clone();
        let key = key.to_string();
        Box::pin(async move { Ok(entries.read().await.get(&key).cloned()) })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, KeyValueResult<()>> {
        let entries = self.entries.clone();
        let path = self.path.clone();
        let key = key.to_string();
        Box::pin(async move {
            // Hold the write lock across the flush so concurrent sets land in order.
            let mut guard = entries.write().await;
            let mut next = guard.clone();
            next.insert(key, value);
            let encoded = serde_json::to_string_pretty(&next).map_err(KeyValueError::Serialize)?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| KeyValueError::Io {
                        path: parent.display().to_string(),
                        source,
                    })?;
            }
            tokio::fs::write(path.as_ref(), encoded)
                .await
                .map_err(|source| KeyValueError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
            // Memory only changes once the file holds the new map.
            *guard = next;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_values() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("theme").await.unwrap(), None);
        store.set("theme", "light".into()).await.unwrap();
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "arcade-hub-kv-{}.json",
            uuid::Uuid::new_v4().simple()
        ));

        let store = FileKeyValueStore::open(&path).await;
        store.set("playerName", "ada".into()).await.unwrap();

        let reopened = FileKeyValueStore::open(&path).await;
        assert_eq!(
            reopened.get("playerName").await.unwrap().as_deref(),
            Some("ada")
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn failed_flush_leaves_memory_untouched() {
        // A directory cannot be written as a file, so every flush fails.
        let path = std::env::temp_dir().join(format!(
            "arcade-hub-kv-dir-{}",
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::create_dir_all(&path).unwrap();

        let store = FileKeyValueStore::open(&path).await;
        let err = store.set("theme", "light".into()).await.unwrap_err();
        assert!(matches!(err, KeyValueError::Io { .. }));
        assert_eq!(store.get("theme").await.unwrap(), None);

        let _ = std::fs::remove_dir(&path);
    }
}
