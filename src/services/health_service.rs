use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `ok` or `degraded`, pinging the document store when one is installed.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "document store health check failed");
                return HealthResponse::new(true);
            }
        }
        Err(_) => warn!("document store unavailable (degraded mode)"),
    }

    HealthResponse::new(state.is_degraded())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dto::health::HealthStatus,
        config::AppConfig,
        dao::{document_store::memory::MemoryDocumentStore, keyvalue::MemoryKeyValueStore},
        state::AppState,
    };

    #[tokio::test]
    async fn reports_store_reachability() {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryKeyValueStore::new()));
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);

        let store = MemoryDocumentStore::new();
        state.install_store(Arc::new(store.clone())).await;
        assert_eq!(health_status(&state).await.status, HealthStatus::Ok);

        store.set_offline(true);
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);
    }
}
