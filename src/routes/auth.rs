use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{delete, post},
};
use axum_valid::Valid;

use crate::{
    dto::auth::{CustomTokenRequest, SessionResponse},
    error::AppError,
    services::auth_service,
    state::SharedState,
};

/// Session management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/anonymous", post(sign_in_anonymous))
        .route("/auth/token", post(sign_in_with_token))
        .route("/auth/session", delete(sign_out))
}

/// Start a session under a fresh anonymous identity.
#[utoipa::path(
    post,
    path = "/auth/anonymous",
    tag = "auth",
    responses((status = 200, description = "Session created", body = SessionResponse))
)]
pub async fn sign_in_anonymous(State(state): State<SharedState>) -> Json<SessionResponse> {
    Json(auth_service::sign_in_anonymous(&state))
}

/// Start a session with a configured custom token.
#[utoipa::path(
    post,
    path = "/auth/token",
    tag = "auth",
    request_body = CustomTokenRequest,
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
        (status = 401, description = "Unknown token")
    )
)]
pub async fn sign_in_with_token(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CustomTokenRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(auth_service::sign_in_with_token(&state, &payload.token)?))
}

/// End the session identified by the bearer token.
#[utoipa::path(
    delete,
    path = "/auth/session",
    tag = "auth",
    params(("Authorization" = String, Header, description = "Bearer session token")),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Missing or unknown token")
    )
)]
pub async fn sign_out(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = auth_service::bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
    if auth_service::sign_out(&state, token) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Unauthorized("unknown session token".into()))
    }
}
