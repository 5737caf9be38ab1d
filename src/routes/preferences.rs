use axum::{
    Extension, Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::preferences::{HighScoreRequest, PreferencesResponse, UpdatePreferencesRequest},
    error::{AppError, ServiceError},
    services::auth_service,
    state::{AuthSession, SharedState},
};

/// Per-player preference endpoints, all requiring a bearer session.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/preferences",
            get(get_preferences).put(update_preferences),
        )
        .route("/preferences/high-scores", post(record_high_score))
        .route("/preferences/games-played", post(record_game_played))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

/// Everything stored for the caller.
#[utoipa::path(
    get,
    path = "/preferences",
    tag = "preferences",
    params(("Authorization" = String, Header, description = "Bearer session token")),
    responses((status = 200, description = "Stored preferences", body = PreferencesResponse))
)]
pub async fn get_preferences(
    State(state): State<SharedState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let loaded = state
        .preferences()
        .load(&session.user_id)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(loaded))
}

/// Change the theme and/or the remembered player name.
#[utoipa::path(
    put,
    path = "/preferences",
    tag = "preferences",
    params(("Authorization" = String, Header, description = "Bearer session token")),
    request_body = UpdatePreferencesRequest,
    responses((status = 200, description = "Updated preferences", body = PreferencesResponse))
)]
pub async fn update_preferences(
    State(state): State<SharedState>,
    Extension(session): Extension<AuthSession>,
    Valid(Json(payload)): Valid<Json<UpdatePreferencesRequest>>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let updated = state
        .preferences()
        .update(&session.user_id, payload)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(updated))
}

/// Report a score on one game; the stored best only ever increases.
#[utoipa::path(
    post,
    path = "/preferences/high-scores",
    tag = "preferences",
    params(("Authorization" = String, Header, description = "Bearer session token")),
    request_body = HighScoreRequest,
    responses((status = 200, description = "Updated preferences", body = PreferencesResponse))
)]
pub async fn record_high_score(
    State(state): State<SharedState>,
    Extension(session): Extension<AuthSession>,
    Valid(Json(payload)): Valid<Json<HighScoreRequest>>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let updated = state
        .preferences()
        .record_high_score(&session.user_id, &payload.game_id, payload.score)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(updated))
}

/// Count one more game played.
#[utoipa::path(
    post,
    path = "/preferences/games-played",
    tag = "preferences",
    params(("Authorization" = String, Header, description = "Bearer session token")),
    responses((status = 200, description = "Updated preferences", body = PreferencesResponse))
)]
pub async fn record_game_played(
    State(state): State<SharedState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let preferences = state.preferences();
    preferences
        .increment_games_played(&session.user_id)
        .await
        .map_err(ServiceError::from)?;
    let loaded = preferences
        .load(&session.user_id)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(loaded))
}

async fn require_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = auth_service::bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
    let session = auth_service::resolve(&state, token)
        .ok_or_else(|| AppError::Unauthorized("unknown session token".into()))?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
