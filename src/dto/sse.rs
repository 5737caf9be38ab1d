use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{catalog::GameView, leaderboard::LeaderboardEntryView};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast whenever a reconciled catalog snapshot is published.
pub struct CatalogUpdatedEvent {
    pub games: Vec<GameView>,
    /// Number of writes reconciliation sent to the store for this snapshot.
    pub pending_writes: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the top of the leaderboard changes.
pub struct LeaderboardUpdatedEvent {
    pub entries: Vec<LeaderboardEntryView>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the promotional feed rotates.
pub struct BuzzEvent {
    pub message: String,
}
