use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::buzz::BuzzResponse, services::buzz_service, state::SharedState};

/// Current promotional message.
#[utoipa::path(
    get,
    path = "/buzz",
    tag = "buzz",
    responses((status = 200, description = "Message on display", body = BuzzResponse))
)]
pub async fn current_buzz(State(state): State<SharedState>) -> Json<BuzzResponse> {
    Json(BuzzResponse {
        message: buzz_service::current(&state).await,
    })
}

pub fn router() -> Router<SharedState> {
    Router::new().route("/buzz", get(current_buzz))
}
