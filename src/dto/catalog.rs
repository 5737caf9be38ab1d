use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{catalog::SortKey, dao::models::GameRecord};

/// Query string accepted by `GET /games`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GamesQuery {
    /// Case-insensitive substring matched against name, genre, developer and tags.
    #[serde(default)]
    pub search: String,
    /// Category id, genre, or `all`.
    pub category: Option<String>,
    pub sort: Option<SortKey>,
}

/// A catalog record as returned to clients, including its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: String,
    #[serde(flatten)]
    pub game: GameRecord,
    pub native: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_color: Option<String>,
}

impl From<GameRecord> for GameView {
    fn from(game: GameRecord) -> Self {
        Self {
            id: game.id.clone(),
            native: game.is_native(),
            difficulty_color: game.difficulty.map(|d| d.color().to_string()),
            game,
        }
    }
}

/// Visible list produced by the query engine.
#[derive(Debug, Serialize, ToSchema)]
pub struct GamesResponse {
    pub games: Vec<GameView>,
    pub total: usize,
}

/// One record plus the caller's best score on it, when signed in.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameDetailResponse {
    #[serde(flatten)]
    pub game: GameView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_score: Option<u64>,
}

pub fn to_views(games: Vec<GameRecord>) -> Vec<GameView> {
    games.into_iter().map(GameView::from).collect()
}
