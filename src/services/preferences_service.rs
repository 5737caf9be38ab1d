//! Per-player preferences over the opaque string key-value store.
//!
//! Keys are namespaced as `{userId}:{field}`. Unreadable values fall back to their default.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::warn;

use crate::{
    dao::{
        keyvalue::{KeyValueError, KeyValueResult, KeyValueStore},
        models::Theme,
    },
    dto::preferences::{PreferencesResponse, UpdatePreferencesRequest},
};

const THEME_KEY: &str = "theme";
const PLAYER_NAME_KEY: &str = "playerName";
const HIGH_SCORES_KEY: &str = "highScores";
const GAMES_PLAYED_KEY: &str = "totalGamesPlayed";

/// Typed access to the values persisted for each player.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    // Serialises read-modify-write updates.
    write_gate: Arc<Mutex<()>>,
}

fn key(user_id: &str, field: &str) -> String {
    format!("{user_id}:{field}")
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    pub async fn theme(&self, user_id: &str) -> KeyValueResult<Theme> {
        let raw = self.store.get(&key(user_id, THEME_KEY)).await?;
        Ok(raw.as_deref().and_then(Theme::parse).unwrap_or_default())
    }

    pub async fn set_theme(&self, user_id: &str, theme: Theme) -> KeyValueResult<()> {
        self.store
            .set(&key(user_id, THEME_KEY), theme.as_str().to_string())
            .await
    }

    pub async fn player_name(&self, user_id: &str) -> KeyValueResult<Option<String>> {
        self.store.get(&key(user_id, PLAYER_NAME_KEY)).await
    }

    pub async fn high_scores(&self, user_id: &str) -> KeyValueResult<IndexMap<String, u64>> {
        let raw = self.store.get(&key(user_id, HIGH_SCORES_KEY)).await?;
        Ok(raw
            .map(|raw| {
                serde_json::from_str(&raw).unwrap_or_else(|err| {
                    warn!(%user_id, error = %err, "discarding unreadable high scores");
                    IndexMap::new()
                })
            })
            .unwrap_or_default())
    }

    pub async fn games_played(&self, user_id: &str) -> KeyValueResult<u64> {
        let raw = self.store.get(&key(user_id, GAMES_PLAYED_KEY)).await?;
        Ok(raw.and_then(|raw| raw.parse().ok()).unwrap_or(0))
    }

    /// Everything stored for `user_id`.
    pub async fn load(&self, user_id: &str) -> KeyValueResult<PreferencesResponse> {
        let high_scores = self.high_scores(user_id).await?;
        Ok(PreferencesResponse {
            theme: self.theme(user_id).await?,
            player_name: self.player_name(user_id).await?,
            total_high_score: high_scores.values().sum(),
            high_scores,
            total_games_played: self.games_played(user_id).await?,
        })
    }

    pub async fn update(
        &self,
        user_id: &str,
        request: UpdatePreferencesRequest,
    ) -> KeyValueResult<PreferencesResponse> {
        if let Some(theme) = request.theme {
            self.set_theme(user_id, theme).await?;
        }
        if let Some(name) = request.player_name {
            self.store
                .set(&key(user_id, PLAYER_NAME_KEY), name.trim().to_string())
                .await?;
        }
        self.load(user_id).await
    }

    /// Keep `score` for `game_id` when it beats the stored one.
    pub async fn record_high_score(
        &self,
        user_id: &str,
        game_id: &str,
        score: u64,
    ) -> KeyValueResult<PreferencesResponse> {
        {
            let _gate = self.write_gate.lock().await;
            let mut scores = self.high_scores(user_id).await?;
            let best = scores.entry(game_id.to_string()).or_insert(0);
            if score > *best {
                *best = score;
                let encoded = serde_json::to_string(&scores)
                    .map_err(KeyValueError::Serialize)?;
                self.store.set(&key(user_id, HIGH_SCORES_KEY), encoded).await?;
            }
        }
        self.load(user_id).await
    }

    pub async fn increment_games_played(&self, user_id: &str) -> KeyValueResult<u64> {
        let _gate = self.write_gate.lock().await;
        let next = self.games_played(user_id).await?.saturating_add(1);
        self.store
            .set(&key(user_id, GAMES_PLAYED_KEY), next.to_string())
            .await?;
        Ok(next)
    }
}
