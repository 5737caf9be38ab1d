use std::sync::Arc;

use arcade_hub::{
    catalog::reconcile,
    config::AppConfig,
    dao::{
        defaults::default_games,
        document_store::{CollectionPath, DocumentStore, memory::MemoryDocumentStore},
        keyvalue::MemoryKeyValueStore,
    },
    routes,
    state::{AppState, SharedState},
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn json_body(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn test_app() -> (Router, SharedState, MemoryDocumentStore) {
    let mut config = AppConfig::default();
    config
        .custom_tokens
        .insert("arcade-owner".into(), "owner".into());
    let state = AppState::new(config, Arc::new(MemoryKeyValueStore::new()));
    state.publish_catalog(reconcile(None, &default_games()).records);
    let store = MemoryDocumentStore::new();
    state.install_store(Arc::new(store.clone())).await;
    (routes::router(state.clone()), state, store)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_json(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn anonymous_token(app: &Router) -> String {
    let res = app
        .clone()
        .oneshot(send_json(Method::POST, "/auth/anonymous", None, json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    json_body(res).await["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn healthcheck_follows_store_state() {
    let (app, _, store) = test_app().await;
    let res = app.clone().oneshot(get("/healthcheck")).await.unwrap();
    assert_eq!(json_body(res).await, json!({"status": "ok"}));

    store.set_offline(true);
    let res = app.oneshot(get("/healthcheck")).await.unwrap();
    assert_eq!(json_body(res).await, json!({"status": "degraded"}));
}

#[tokio::test]
async fn games_are_searched_filtered_and_sorted() {
    let (app, _, _) = test_app().await;

    let res = app.clone().oneshot(get("/games?search=SNAKE")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["games"].as_array().unwrap().len(), 1);
    assert_eq!(body["games"][0]["name"], "Snake");
    assert_eq!(body["total"], default_games().len());

    let res = app
        .clone()
        .oneshot(get("/games?category=puzzle&sort=name-ascending"))
        .await
        .unwrap();
    let body = json_body(res).await;
    let names: Vec<String> = body["games"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap().to_lowercase())
        .collect();
    assert!(!names.is_empty());
    assert!(names.windows(2).all(|w| w[0] <= w[1]));

    let res = app.oneshot(get("/games?search=zzzz-nothing")).await.unwrap();
    assert!(json_body(res).await["games"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_game_is_not_found() {
    let (app, _, _) = test_app().await;
    let res = app.oneshot(get("/games/does-not-exist")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(json_body(res).await["message"].is_string());
}

#[tokio::test]
async fn categories_start_with_all() {
    let (app, _, _) = test_app().await;
    let res = app.oneshot(get("/categories")).await.unwrap();
    let body = json_body(res).await;
    assert_eq!(body[0]["id"], "all");
    assert_eq!(body[0]["count"], default_games().len());
}

#[tokio::test]
async fn score_submission_requires_a_session_and_is_rate_limited() {
    let (app, _, store) = test_app().await;
    let score = json!({"playerName": "Ada", "score": 2048});

    let res = app
        .clone()
        .oneshot(send_json(Method::POST, "/leaderboard", None, score.clone()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = anonymous_token(&app).await;
    let res = app
        .clone()
        .oneshot(send_json(Method::POST, "/leaderboard", Some(&token), score.clone()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(json_body(res).await["id"].is_string());

    let res = app
        .clone()
        .oneshot(send_json(Method::POST, "/leaderboard", Some(&token), score))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));

    let stored = store
        .get_all(&CollectionPath::leaderboard("arcade-hub"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn blank_player_names_are_rejected() {
    let (app, _, _) = test_app().await;
    let token = anonymous_token(&app).await;
    let res = app
        .oneshot(send_json(
            Method::POST,
            "/leaderboard",
            Some(&token),
            json!({"playerName": "   ", "score": 10}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn custom_tokens_sign_in_known_users_only() {
    let (app, _, _) = test_app().await;
    let res = app
        .clone()
        .oneshot(send_json(
            Method::POST,
            "/auth/token",
            None,
            json!({"token": "arcade-owner"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["userId"], "owner");

    let res = app
        .oneshot(send_json(
            Method::POST,
            "/auth/token",
            None,
            json!({"token": "guess"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn preferences_are_private_and_accumulate() {
    let (app, _, _) = test_app().await;
    let res = app.clone().oneshot(get("/preferences")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = anonymous_token(&app).await;
    let res = app
        .clone()
        .oneshot(send_json(
            Method::PUT,
            "/preferences",
            Some(&token),
            json!({"theme": "light", "playerName": " Ada "}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["theme"], "light");
    assert_eq!(body["playerName"], "Ada");

    for (game, score) in [("2048", 900), ("snake", 40), ("2048", 100)] {
        let res = app
            .clone()
            .oneshot(send_json(
                Method::POST,
                "/preferences/high-scores",
                Some(&token),
                json!({"gameId": game, "score": score}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = app
        .oneshot(send_json(
            Method::POST,
            "/preferences/games-played",
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body["highScores"]["2048"], 900);
    assert_eq!(body["totalHighScore"], 940);
    assert_eq!(body["totalGamesPlayed"], 1);
}

#[tokio::test]
async fn buzz_returns_a_message() {
    let (app, _, _) = test_app().await;
    let res = app.oneshot(get("/buzz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!json_body(res).await["message"].as_str().unwrap().is_empty());
}
