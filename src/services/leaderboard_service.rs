//! Append-only score submission and the live top-N view.

use std::time::{Duration, SystemTime};

use dashmap::mapref::entry::Entry;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::{
    dao::{
        document_store::{CollectionPath, Document, DocumentStore, OrderBy},
        models::LeaderboardEntry,
    },
    dto::validation::validate_player_name,
    error::GatewayError,
    services::{catalog_service::wait_for_store, sse_events},
    state::{AuthSession, SharedState},
};

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

/// Live top-N view of the leaderboard.
pub type TopStream = BoxStream<'static, Result<Vec<LeaderboardEntry>, GatewayError>>;

/// Validate and append one score for the signed-in player. Returns the stored entry id.
pub async fn submit_score(
    state: &SharedState,
    session: Option<&AuthSession>,
    player_name: &str,
    score: u64,
) -> Result<String, GatewayError> {
    let session = session.ok_or(GatewayError::Unauthenticated)?;

    validate_player_name(player_name).map_err(|err| {
        GatewayError::Validation(
            err.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string()),
        )
    })?;
    let config = state.config();
    if score > config.max_score {
        return Err(GatewayError::Validation(format!(
            "score {score} exceeds the maximum of {}",
            config.max_score
        )));
    }

    let store = state.store().await.ok_or(GatewayError::Unavailable(None))?;
    reserve_submission(state, &session.user_id, config.submission_cooldown)?;

    let entry = LeaderboardEntry {
        id: String::new(),
        user_id: session.user_id.clone(),
        player_name: player_name.trim().to_string(),
        score,
        timestamp: SystemTime::now(),
    };
    let body = serde_json::to_value(&entry)
        .map_err(|err| GatewayError::Validation(format!("unencodable entry: {err}")))?;

    match store.add(&state.leaderboard_collection(), body).await {
        Ok(id) => {
            info!(%id, user_id = %entry.user_id, score, "score submitted");
            Ok(id)
        }
        Err(err) => {
            // A failed write must not count against the cooldown.
            state.last_submissions().remove(&session.user_id);
            warn!(user_id = %entry.user_id, error = %err, "score submission failed");
            Err(err.into())
        }
    }
}

/// Enforce one submission per player per `cooldown`.
fn reserve_submission(
    state: &SharedState,
    user_id: &str,
    cooldown: Duration,
) -> Result<(), GatewayError> {
    let now = Instant::now();
    match state.last_submissions().entry(user_id.to_string()) {
        Entry::Occupied(mut last) => {
            let elapsed = now.saturating_duration_since(*last.get());
            if elapsed < cooldown {
                let remaining = cooldown - elapsed;
                return Err(GatewayError::RateLimited {
                    retry_after_secs: remaining.as_secs().max(1),
                });
            }
            last.insert(now);
        }
        Entry::Vacant(slot) => {
            slot.insert(now);
        }
    }
    Ok(())
}

/// Decode leaderboard documents, dropping malformed ones, and enforce ordering and size.
pub fn decode_entries(docs: Vec<Document>, limit: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = docs
        .into_iter()
        .filter_map(|doc| match LeaderboardEntry::from_document(&doc.id, doc.body) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(id = %doc.id, error = %err, "dropping malformed leaderboard entry");
                None
            }
        })
        .collect();
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(limit);
    entries
}

/// Subscribe to the `n` best scores, ordered by score descending.
///
/// The store query is not limited: malformed entries are dropped first so they never take
/// one of the `n` slots.
pub fn subscribe_top(store: &dyn DocumentStore, collection: &CollectionPath, n: usize) -> TopStream {
    store
        .query(collection, OrderBy::desc("score"), usize::MAX)
        .map_ok(move |docs| decode_entries(docs, n))
        .map_err(GatewayError::from)
        .boxed()
}

/// Mirror the top of the leaderboard into the shared state for as long as the process runs.
pub async fn run_watcher(state: SharedState) {
    let size = state.config().leaderboard_size;
    loop {
        let store = wait_for_store(&state).await;
        let mut top = subscribe_top(store.as_ref(), &state.leaderboard_collection(), size);
        let mut degraded = state.degraded_watcher();

        loop {
            tokio::select! {
                next = top.next() => match next {
                    Some(Ok(entries)) => {
                        sse_events::broadcast_leaderboard_updated(&state, &entries);
                        state.publish_leaderboard(entries);
                    }
                    Some(Err(err)) => warn!(error = %err, "leaderboard snapshot failed"),
                    None => break,
                },
                changed = degraded.changed() => {
                    if changed.is_err() || *degraded.borrow_and_update() {
                        break;
                    }
                }
            }
        }

        warn!("leaderboard subscription ended; resubscribing");
        sleep(RESUBSCRIBE_DELAY).await;
    }
}
