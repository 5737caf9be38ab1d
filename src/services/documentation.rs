use utoipa::OpenApi;

#[derive(OpenApi)]
/// OpenAPI document covering every Arcade Hub route.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::games::list_games,
        crate::routes::games::get_game,
        crate::routes::games::list_categories,
        crate::routes::auth::sign_in_anonymous,
        crate::routes::auth::sign_in_with_token,
        crate::routes::auth::sign_out,
        crate::routes::leaderboard::get_leaderboard,
        crate::routes::leaderboard::submit_score,
        crate::routes::preferences::get_preferences,
        crate::routes::preferences::update_preferences,
        crate::routes::preferences::record_high_score,
        crate::routes::preferences::record_game_played,
        crate::routes::buzz::current_buzz,
        crate::routes::sse::public_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::catalog::GameView,
            crate::dto::catalog::GamesResponse,
            crate::dto::catalog::GameDetailResponse,
            crate::catalog::CategoryDescriptor,
            crate::catalog::SortKey,
            crate::dto::auth::CustomTokenRequest,
            crate::dto::auth::SessionResponse,
            crate::dto::leaderboard::SubmitScoreRequest,
            crate::dto::leaderboard::SubmitScoreResponse,
            crate::dto::leaderboard::LeaderboardEntryView,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::preferences::PreferencesResponse,
            crate::dto::preferences::UpdatePreferencesRequest,
            crate::dto::preferences::HighScoreRequest,
            crate::dto::buzz::BuzzResponse,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::CatalogUpdatedEvent,
            crate::dto::sse::LeaderboardUpdatedEvent,
            crate::dto::sse::BuzzEvent,
            crate::dto::ws::SessionInboundMessage,
            crate::dto::ws::SessionOutboundMessage,
            crate::dao::models::GameRecord,
            crate::dao::models::Category,
            crate::dao::models::Difficulty,
            crate::dao::models::Theme,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Game catalog queries"),
        (name = "auth", description = "Session sign-in and sign-out"),
        (name = "leaderboard", description = "Score submission and the live top scores"),
        (name = "preferences", description = "Per-player persisted preferences"),
        (name = "buzz", description = "Promotional message feed"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "session", description = "Interactive WebSocket session"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_schema_lists_high_scores_as_a_map() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let high_scores =
            &doc["components"]["schemas"]["PreferencesResponse"]["properties"]["highScores"];
        assert_eq!(high_scores["type"], "object");
        assert!(high_scores.get("additionalProperties").is_some());
    }
}
