use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

pub mod auth;
pub mod buzz;
pub mod games;
pub mod health;
pub mod leaderboard;
pub mod preferences;
pub mod sse;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(games::router())
        .merge(auth::router())
        .merge(leaderboard::router())
        .merge(preferences::router(state.clone()))
        .merge(buzz::router())
        .merge(sse::router())
        .merge(websocket::router());

    api_router
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
