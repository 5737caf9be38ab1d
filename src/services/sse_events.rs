use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::{GameRecord, LeaderboardEntry},
    dto::{
        catalog::to_views,
        leaderboard,
        sse::{BuzzEvent, CatalogUpdatedEvent, LeaderboardUpdatedEvent, ServerEvent, SystemStatus},
    },
    state::SharedState,
};

pub const EVENT_CATALOG_UPDATED: &str = "catalog.updated";
pub const EVENT_LEADERBOARD_UPDATED: &str = "leaderboard.updated";
pub const EVENT_BUZZ: &str = "buzz";
pub const EVENT_SYSTEM_STATUS: &str = "system_status";

/// Broadcast a freshly reconciled catalog.
pub fn broadcast_catalog_updated(state: &SharedState, records: &[GameRecord], pending_writes: usize) {
    let payload = CatalogUpdatedEvent {
        games: to_views(records.to_vec()),
        pending_writes,
    };
    send_public_event(state, EVENT_CATALOG_UPDATED, &payload);
}

/// Broadcast the current top of the leaderboard.
pub fn broadcast_leaderboard_updated(state: &SharedState, entries: &[LeaderboardEntry]) {
    let payload = LeaderboardUpdatedEvent {
        entries: leaderboard::to_views(entries),
    };
    send_public_event(state, EVENT_LEADERBOARD_UPDATED, &payload);
}

/// Broadcast the promotional message now on display.
pub fn broadcast_buzz(state: &SharedState, message: &str) {
    let payload = BuzzEvent {
        message: message.to_string(),
    };
    send_public_event(state, EVENT_BUZZ, &payload);
}

/// Broadcast a degraded-mode transition.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => {
            state.public_sse().broadcast(event);
        }
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
