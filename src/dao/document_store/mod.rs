#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use std::{cmp::Ordering, fmt};

use futures::{
    StreamExt, TryStreamExt,
    future::BoxFuture,
    stream::BoxStream,
};
use serde_json::{Map, Value};

use crate::dao::storage::StorageResult;

/// Live sequence of full collection snapshots. Dropping the stream unsubscribes.
pub type SnapshotStream = BoxStream<'static, StorageResult<Vec<Document>>>;

/// Slash separated collection path, namespaced by the application identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Collection holding the game catalog.
    pub fn games(app_id: &str) -> Self {
        Self(format!("artifacts/{app_id}/public/data/games"))
    }

    /// Collection holding submitted leaderboard scores.
    pub fn leaderboard(app_id: &str) -> Self {
        Self(format!("artifacts/{app_id}/public/data/leaderboard_2048"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored document: store-assigned identifier plus its JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Ordering applied by [`DocumentStore::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Abstraction over the remote document database backing the catalog and leaderboard.
pub trait DocumentStore: Send + Sync {
    fn get_all(&self, collection: &CollectionPath) -> BoxFuture<'static, StorageResult<Vec<Document>>>;

    /// Stream the whole collection, once immediately and again after every change.
    fn subscribe(&self, collection: &CollectionPath) -> SnapshotStream;

    /// Like [`DocumentStore::subscribe`], ordered by a body field and truncated to `limit`.
    fn query(&self, collection: &CollectionPath, order_by: OrderBy, limit: usize) -> SnapshotStream {
        self.subscribe(collection)
            .map_ok(move |mut docs| {
                order_and_limit(&mut docs, &order_by, limit);
                docs
            })
            .boxed()
    }

    /// Insert a new document and return the identifier the store assigned.
    fn add(&self, collection: &CollectionPath, body: Value) -> BoxFuture<'static, StorageResult<String>>;

    /// Merge `patch` into an existing document. Fails with `NotFound` when the id is unknown.
    fn merge_set(
        &self,
        collection: &CollectionPath,
        id: &str,
        patch: Value,
    ) -> BoxFuture<'static, StorageResult<()>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Stable sort by `order.field`, then truncate. Documents missing the field sort last.
pub fn order_and_limit(docs: &mut Vec<Document>, order: &OrderBy, limit: usize) {
    docs.sort_by(|a, b| {
        let left = a.body.get(&order.field);
        let right = b.body.get(&order.field);
        match (left, right) {
            (Some(l), Some(r)) => {
                let ord = compare_values(l, r);
                if order.descending { ord.reverse() } else { ord }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    docs.truncate(limit);
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            let l = l.as_f64().unwrap_or(0.0);
            let r = r.as_f64().unwrap_or(0.0);
            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        (Value::String(l), Value::String(r)) => l.cmp(r),
        _ => Ordering::Equal,
    }
}

/// Recursively merge object fields of `patch` into `target`; non-objects overwrite.
pub fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => merge_object(target, patch),
        (target, patch) => *target = patch,
    }
}

/// Field-wise variant of [`merge_json`] for bodies already known to be objects.
pub fn merge_object(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match target.get_mut(&key) {
            Some(existing) if existing.is_object() && value.is_object() => {
                merge_json(existing, value)
            }
            _ => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(id: &str, score: i64) -> Document {
        Document {
            id: id.into(),
            body: json!({ "score": score }),
        }
    }

    #[test]
    fn collection_paths_are_namespaced() {
        assert_eq!(
            CollectionPath::games("hub").as_str(),
            "artifacts/hub/public/data/games"
        );
        assert_eq!(
            CollectionPath::leaderboard("hub").to_string(),
            "artifacts/hub/public/data/leaderboard_2048"
        );
    }

    #[test]
    fn order_desc_is_stable_and_limited() {
        let mut docs = vec![doc("a", 10), doc("b", 30), doc("c", 10), doc("d", 20)];
        order_and_limit(&mut docs, &OrderBy::desc("score"), 3);
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["b", "d", "a"]);
    }

    #[test]
    fn missing_field_sorts_last() {
        let mut docs = vec![
            Document {
                id: "x".into(),
                body: json!({}),
            },
            doc("y", 1),
        ];
        order_and_limit(&mut docs, &OrderBy::desc("score"), 10);
        assert_eq!(docs[0].id, "y");
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let mut target = json!({"name": "2048", "url": "old", "meta": {"a": 1, "b": 2}});
        merge_json(&mut target, json!({"url": "new", "meta": {"b": 3}}));
        assert_eq!(
            target,
            json!({"name": "2048", "url": "new", "meta": {"a": 1, "b": 3}})
        );
    }
}
