use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
};

use crate::{
    catalog::CategoryDescriptor,
    dto::catalog::{GameDetailResponse, GamesQuery, GamesResponse},
    error::AppError,
    services::{auth_service, catalog_service},
    state::SharedState,
};

/// Read-only catalog queries.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games))
        .route("/games/{id}", get(get_game))
        .route("/categories", get(list_categories))
}

/// Filter and sort the current catalog.
#[utoipa::path(
    get,
    path = "/games",
    tag = "catalog",
    params(GamesQuery),
    responses((status = 200, description = "Visible games", body = GamesResponse))
)]
pub async fn list_games(
    State(state): State<SharedState>,
    Query(query): Query<GamesQuery>,
) -> Json<GamesResponse> {
    Json(catalog_service::list_games(&state, query))
}

/// Retrieve one game, with the caller's high score when a bearer token is supplied.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "catalog",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game", body = GameDetailResponse),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<GameDetailResponse>, AppError> {
    let session = auth_service::session_from_headers(&state, &headers);
    Ok(Json(
        catalog_service::get_game(&state, &id, session.as_ref()).await?,
    ))
}

/// Sidebar categories with per-category game counts.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    responses((status = 200, description = "Categories", body = [CategoryDescriptor]))
)]
pub async fn list_categories(State(state): State<SharedState>) -> Json<Vec<CategoryDescriptor>> {
    Json(catalog_service::categories(&state))
}
