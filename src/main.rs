//! Arcade Hub binary entrypoint wiring REST, WebSocket, SSE and the background sync tasks.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use arcade_hub::{
    config::AppConfig,
    dao::{
        document_store::{DocumentStore, memory::MemoryDocumentStore},
        keyvalue::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore},
        storage::StorageError,
    },
    routes,
    services::{buzz_service, catalog_service, leaderboard_service, storage_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let preferences: Arc<dyn KeyValueStore> = match &config.preferences_path {
        Some(path) => Arc::new(FileKeyValueStore::open(path.clone()).await),
        None => Arc::new(MemoryKeyValueStore::new()),
    };
    let state = AppState::new(config, preferences);
    spawn_background_tasks(&state);

    let addr = listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "arcade hub listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")
}

/// `PORT`, then `SERVER_PORT`, then 8080, on all interfaces.
fn listen_addr() -> SocketAddr {
    let port = ["PORT", "SERVER_PORT"]
        .into_iter()
        .find_map(|var| env::var(var).ok()?.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from(([0, 0, 0, 0], port))
}

fn spawn_background_tasks(state: &SharedState) {
    match env::var("STORE").as_deref() {
        #[cfg(feature = "couch-store")]
        Ok("couch") => {
            tokio::spawn(storage_supervisor::run(state.clone(), connect_couch));
        }
        Ok("memory") | Err(_) => {
            let store = MemoryDocumentStore::new();
            tokio::spawn(storage_supervisor::run(state.clone(), move || {
                let store: Arc<dyn DocumentStore> = Arc::new(store.clone());
                async move { Ok::<_, StorageError>(store) }
            }));
        }
        Ok(other) => {
            warn!(store = other, "unknown STORE value; running without a document store");
        }
    }

    tokio::spawn(catalog_service::run(state.clone()));
    tokio::spawn(leaderboard_service::run_watcher(state.clone()));
    tokio::spawn(buzz_service::run(state.clone(), text_generator()));
}

#[cfg(feature = "couch-store")]
async fn connect_couch() -> Result<Arc<dyn DocumentStore>, StorageError> {
    use arcade_hub::dao::document_store::couchdb::{CouchConfig, CouchDocumentStore};

    let config = CouchConfig::from_env()?;
    let store = CouchDocumentStore::connect(config).await?;
    Ok(Arc::new(store))
}

#[cfg(feature = "remote-buzz")]
fn text_generator() -> Option<Arc<dyn buzz_service::TextGenerator>> {
    buzz_service::HttpTextGenerator::from_env()
        .map(|generator| Arc::new(generator) as Arc<dyn buzz_service::TextGenerator>)
}

#[cfg(not(feature = "remote-buzz"))]
fn text_generator() -> Option<Arc<dyn buzz_service::TextGenerator>> {
    None
}

fn build_router(state: SharedState) -> Router {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// `RUST_LOG` wins; otherwise info, with request traces from tower-http.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable; waiting for Ctrl+C only");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
