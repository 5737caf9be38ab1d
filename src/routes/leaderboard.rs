use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::leaderboard::{self, LeaderboardResponse, SubmitScoreRequest, SubmitScoreResponse},
    error::{AppError, ServiceError},
    services::{auth_service, leaderboard_service},
    state::SharedState,
};

/// Leaderboard read and submit endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/leaderboard", get(get_leaderboard).post(submit_score))
}

/// Current top scores, best first.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    responses((status = 200, description = "Top scores", body = LeaderboardResponse))
)]
pub async fn get_leaderboard(State(state): State<SharedState>) -> Json<LeaderboardResponse> {
    Json(LeaderboardResponse {
        entries: leaderboard::to_views(&state.leaderboard()),
    })
}

/// Append a score for the signed-in player.
#[utoipa::path(
    post,
    path = "/leaderboard",
    tag = "leaderboard",
    params(("Authorization" = String, Header, description = "Bearer session token")),
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Score stored", body = SubmitScoreResponse),
        (status = 400, description = "Malformed score or player name"),
        (status = 401, description = "Not signed in"),
        (status = 429, description = "Submitted too recently"),
        (status = 503, description = "Leaderboard unavailable")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Valid(Json(payload)): Valid<Json<SubmitScoreRequest>>,
) -> Result<Json<SubmitScoreResponse>, AppError> {
    let session = auth_service::session_from_headers(&state, &headers);
    let id = leaderboard_service::submit_score(
        &state,
        session.as_ref(),
        &payload.player_name,
        payload.score,
    )
    .await
    .map_err(ServiceError::from)?;
    Ok(Json(SubmitScoreResponse { id }))
}
