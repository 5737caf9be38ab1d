//! Keeps the shared catalog in sync with the document store and answers catalog queries.

use std::{collections::HashSet, sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    catalog::{
        ALL_CATEGORIES, CatalogWrite, CategoryDescriptor, compute_visible, describe_categories,
        reconcile,
    },
    dao::{
        defaults::default_games,
        document_store::{CollectionPath, Document, DocumentStore},
        models::GameRecord,
    },
    dto::catalog::{GameDetailResponse, GameView, GamesQuery, GamesResponse, to_views},
    error::ServiceError,
    services::sse_events,
    state::{AuthSession, SharedState},
};

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

/// Decode a snapshot, dropping records that fail validation or repeat an id.
pub fn decode_games(docs: Vec<Document>) -> Vec<GameRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(docs.len());
    for doc in docs {
        let record = match GameRecord::from_document(&doc.id, doc.body) {
            Ok(record) => record,
            Err(err) => {
                warn!(id = %doc.id, error = %err, "dropping undecodable game document");
                continue;
            }
        };
        if let Err(reason) = record.validate() {
            warn!(id = %record.id, %reason, "dropping invalid game document");
            continue;
        }
        if !seen.insert(record.id.clone()) {
            warn!(id = %record.id, "dropping duplicate game id");
            continue;
        }
        records.push(record);
    }
    records
}

/// Send reconciliation writes to the store, returning how many were accepted.
pub async fn perform_writes(
    store: &dyn DocumentStore,
    collection: &CollectionPath,
    writes: Vec<CatalogWrite>,
) -> usize {
    let mut accepted = 0;
    for write in writes {
        let result = match write {
            CatalogWrite::Add(record) => match record.to_document() {
                Ok(body) => store.add(collection, body).await.map(|id| {
                    debug!(%id, name = %record.name, "seeded default game");
                }),
                Err(err) => {
                    warn!(name = %record.name, error = %err, "failed to encode default game");
                    continue;
                }
            },
            CatalogWrite::Patch { id, patch } => match serde_json::to_value(&patch) {
                Ok(body) => store.merge_set(collection, &id, body).await.map(|()| {
                    info!(%id, ?patch, "corrected tracked game fields");
                }),
                Err(err) => {
                    warn!(%id, error = %err, "failed to encode game patch");
                    continue;
                }
            },
        };

        match result {
            Ok(()) => accepted += 1,
            Err(err) => warn!(collection = %collection, error = %err, "catalog write failed"),
        }
    }
    accepted
}

/// Reconcile one snapshot, issue its writes and publish the optimistic result.
///
/// Seeding writes are sent once per process unless some of them fail; later empty snapshots
/// only republish the defaults locally while the store catches up.
pub async fn apply_snapshot(
    state: &SharedState,
    store: &dyn DocumentStore,
    docs: Vec<Document>,
    defaults: &[GameRecord],
) -> usize {
    let remote = decode_games(docs);
    let outcome = reconcile(Some(remote.as_slice()), defaults);

    let seeding = outcome
        .writes
        .iter()
        .any(|write| matches!(write, CatalogWrite::Add(_)));
    let writes = if seeding && !state.claim_seeding() {
        debug!("store still empty after seeding; waiting for it to catch up");
        Vec::new()
    } else {
        outcome.writes
    };

    let issued = writes.len();
    if issued > 0 {
        let accepted = perform_writes(store, &state.games_collection(), writes).await;
        info!(issued, accepted, "reconciliation writes sent");
        if seeding && accepted < issued {
            warn!(issued, accepted, "seeding incomplete; retrying on the next empty snapshot");
            state.release_seeding();
        }
    }

    sse_events::broadcast_catalog_updated(state, &outcome.records, issued);
    state.publish_catalog(outcome.records);
    issued
}

/// Follow the games collection for as long as the process runs.
pub async fn run(state: SharedState) {
    let defaults = default_games();
    if state.catalog().is_empty() {
        state.publish_catalog(reconcile(None, &defaults).records);
    }

    loop {
        let store = wait_for_store(&state).await;
        let collection = state.games_collection();
        let mut snapshots = store.subscribe(&collection);
        let mut degraded = state.degraded_watcher();
        info!(collection = %collection, "catalog subscription started");

        loop {
            tokio::select! {
                next = snapshots.next() => match next {
                    Some(Ok(docs)) => {
                        apply_snapshot(&state, store.as_ref(), docs, &defaults).await;
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "catalog snapshot failed; keeping last known catalog");
                    }
                    None => break,
                },
                changed = degraded.changed() => {
                    if changed.is_err() || *degraded.borrow_and_update() {
                        break;
                    }
                }
            }
        }

        warn!("catalog subscription ended; resubscribing");
        sleep(RESUBSCRIBE_DELAY).await;
    }
}

/// Wait until a store is installed and healthy.
pub async fn wait_for_store(state: &SharedState) -> Arc<dyn DocumentStore> {
    let mut degraded = state.degraded_watcher();
    loop {
        if !state.is_degraded()
            && let Some(store) = state.store().await
        {
            return store;
        }
        if degraded.changed().await.is_err() {
            sleep(RESUBSCRIBE_DELAY).await;
        }
    }
}

/// Run the query engine over the current catalog.
pub fn list_games(state: &SharedState, query: GamesQuery) -> GamesResponse {
    let catalog = state.catalog();
    let category = query.category.as_deref().unwrap_or(ALL_CATEGORIES);
    let games = compute_visible(
        &catalog,
        &query.search,
        category,
        query.sort.unwrap_or_default(),
    );
    GamesResponse {
        total: catalog.len(),
        games: to_views(games),
    }
}

/// Look up one record, attaching the caller's high score when signed in.
pub async fn get_game(
    state: &SharedState,
    id: &str,
    session: Option<&AuthSession>,
) -> Result<GameDetailResponse, ServiceError> {
    let game = state
        .catalog()
        .iter()
        .find(|game| game.id == id)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound(format!("game `{id}`")))?;

    let high_score = match session {
        Some(session) => state
            .preferences()
            .high_scores(&session.user_id)
            .await?
            .get(id)
            .copied(),
        None => None,
    };

    Ok(GameDetailResponse {
        game: GameView::from(game),
        high_score,
    })
}

pub fn categories(state: &SharedState) -> Vec<CategoryDescriptor> {
    describe_categories(&state.catalog())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{document_store::memory::MemoryDocumentStore, keyvalue::MemoryKeyValueStore},
        state::AppState,
    };

    fn state() -> SharedState {
        AppState::new(AppConfig::default(), Arc::new(MemoryKeyValueStore::new()))
    }

    fn doc(id: &str, body: serde_json::Value) -> Document {
        Document {
            id: id.into(),
            body,
        }
    }

    #[test]
    fn invalid_and_duplicate_documents_are_dropped() {
        let valid = default_games()[0].to_document().unwrap();
        let mut out_of_range = valid.clone();
        out_of_range["rating"] = json!(9.0);

        let records = decode_games(vec![
            doc("a", valid.clone()),
            doc("b", out_of_range),
            doc("c", json!({"name": "missing everything"})),
            doc("a", valid),
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a");
    }

    #[tokio::test]
    async fn empty_store_is_seeded_once_then_converges() {
        let state = state();
        let store = MemoryDocumentStore::new();
        let defaults = default_games();
        let collection = state.games_collection();

        let issued = apply_snapshot(&state, &store, Vec::new(), &defaults).await;
        assert_eq!(issued, defaults.len());
        assert_eq!(state.catalog().len(), defaults.len());

        // A stale empty snapshot must not seed a second time.
        let issued = apply_snapshot(&state, &store, Vec::new(), &defaults).await;
        assert_eq!(issued, 0);

        let stored = store.get_all(&collection).await.unwrap();
        assert_eq!(stored.len(), defaults.len());

        let issued = apply_snapshot(&state, &store, stored, &defaults).await;
        assert_eq!(issued, 0);
        assert!(state.catalog().iter().all(|g| !g.id.starts_with("local-")));
    }

    #[tokio::test]
    async fn failed_seeding_is_retried_once_the_store_recovers() {
        let state = state();
        let store = MemoryDocumentStore::new();
        let defaults = default_games();

        store.set_offline(true);
        let issued = apply_snapshot(&state, &store, Vec::new(), &defaults).await;
        assert_eq!(issued, defaults.len());
        assert_eq!(state.catalog().len(), defaults.len());

        store.set_offline(false);
        let issued = apply_snapshot(&state, &store, Vec::new(), &defaults).await;
        assert_eq!(issued, defaults.len());

        let stored = store.get_all(&state.games_collection()).await.unwrap();
        assert_eq!(stored.len(), defaults.len());
    }

    #[tokio::test]
    async fn stale_tracked_field_is_patched_in_the_store() {
        let state = state();
        let store = MemoryDocumentStore::new();
        let defaults = default_games();
        let collection = state.games_collection();

        let mut stale = defaults.clone();
        let index = stale.iter().position(|g| g.name == "Among Us").unwrap();
        stale[index].external_url = "https://stale.example".into();
        for record in &stale {
            store.add(&collection, record.to_document().unwrap()).await.unwrap();
        }

        let docs = store.get_all(&collection).await.unwrap();
        let id = docs[index].id.clone();
        let issued = apply_snapshot(&state, &store, docs, &defaults).await;
        assert_eq!(issued, 1);
        assert_eq!(state.catalog()[index].external_url, defaults[index].external_url);

        let docs = store.get_all(&collection).await.unwrap();
        let patched = docs.iter().find(|d| d.id == id).unwrap();
        assert_eq!(patched.body["url"], json!(defaults[index].external_url));

        assert_eq!(apply_snapshot(&state, &store, docs, &defaults).await, 0);
    }

    #[tokio::test]
    async fn list_games_filters_the_published_catalog() {
        let state = state();
        state.publish_catalog(reconcile(None, &default_games()).records);

        let response = list_games(
            &state,
            GamesQuery {
                search: "snake".into(),
                ..GamesQuery::default()
            },
        );
        assert_eq!(response.games.len(), 1);
        assert_eq!(response.total, default_games().len());
    }

    #[tokio::test]
    async fn unknown_game_is_not_found() {
        let state = state();
        let err = get_game(&state, "nope", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
