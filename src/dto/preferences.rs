use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::models::Theme, dto::validation::validate_player_name};

/// Everything persisted for one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    /// Best score per game id.
    pub high_scores: IndexMap<String, u64>,
    pub total_high_score: u64,
    pub total_games_played: u64,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    pub theme: Option<Theme>,
    #[validate(custom(function = "validate_player_name"))]
    pub player_name: Option<String>,
}

/// Report a score on one game. Only improvements are kept.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HighScoreRequest {
    #[validate(length(min = 1, max = 128))]
    pub game_id: String,
    pub score: u64,
}
