use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::LeaderboardEntry,
    dto::{format_system_time, validation::validate_player_name},
};

/// Score submission body.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    #[validate(custom(function = "validate_player_name"))]
    pub player_name: String,
    pub score: u64,
}

/// Identifier the store assigned to an accepted submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitScoreResponse {
    pub id: String,
}

/// Leaderboard row as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryView {
    pub id: String,
    pub rank: usize,
    pub user_id: String,
    pub player_name: String,
    pub score: u64,
    /// RFC 3339 submission time.
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntryView>,
}

pub fn to_views(entries: &[LeaderboardEntry]) -> Vec<LeaderboardEntryView> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| LeaderboardEntryView {
            id: entry.id.clone(),
            rank: index + 1,
            user_id: entry.user_id.clone(),
            player_name: entry.player_name.clone(),
            score: entry.score,
            timestamp: format_system_time(entry.timestamp),
        })
        .collect()
}
