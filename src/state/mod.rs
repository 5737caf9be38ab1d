pub mod konami;
pub mod lucky_charm;
pub mod session;
mod sse;
pub mod timers;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use tokio::{
    sync::{RwLock, watch},
    time::Instant,
};

use crate::{
    config::AppConfig,
    dao::{
        document_store::{CollectionPath, DocumentStore},
        keyvalue::KeyValueStore,
        models::{GameRecord, LeaderboardEntry},
    },
    error::ServiceError,
    services::{buzz_service::BuzzFeed, preferences_service::Preferences},
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Identity attached to a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub anonymous: bool,
}

/// Central application state storing the storage handle, live views and sessions.
pub struct AppState {
    config: Arc<AppConfig>,
    store: RwLock<Option<Arc<dyn DocumentStore>>>,
    degraded: watch::Sender<bool>,
    catalog: watch::Sender<Arc<Vec<GameRecord>>>,
    leaderboard: watch::Sender<Arc<Vec<LeaderboardEntry>>>,
    public_sse: SseHub,
    sessions: DashMap<String, AuthSession>,
    last_submissions: DashMap<String, Instant>,
    preferences: Preferences,
    buzz: RwLock<BuzzFeed>,
    seeded: AtomicBool,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, preferences: Arc<dyn KeyValueStore>) -> SharedState {
        let (degraded, _rx) = watch::channel(true);
        let (catalog, _rx) = watch::channel(Arc::new(Vec::new()));
        let (leaderboard, _rx) = watch::channel(Arc::new(Vec::new()));
        Arc::new(Self {
            config: Arc::new(config),
            store: RwLock::new(None),
            degraded,
            catalog,
            leaderboard,
            public_sse: SseHub::new(64),
            sessions: DashMap::new(),
            last_submissions: DashMap::new(),
            preferences: Preferences::new(preferences),
            buzz: RwLock::new(BuzzFeed::default()),
            seeded: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    pub fn games_collection(&self) -> CollectionPath {
        CollectionPath::games(&self.config.app_id)
    }

    pub fn leaderboard_collection(&self) -> CollectionPath {
        CollectionPath::leaderboard(&self.config.app_id)
    }

    /// Obtain a handle to the current document store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn DocumentStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Like [`AppState::store`], failing with [`ServiceError::Degraded`] when absent.
    pub async fn require_store(&self) -> Result<Arc<dyn DocumentStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new document store and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn DocumentStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current document store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, returning whether it changed.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    /// Latest reconciled catalog.
    pub fn catalog(&self) -> Arc<Vec<GameRecord>> {
        self.catalog.borrow().clone()
    }

    pub fn catalog_watcher(&self) -> watch::Receiver<Arc<Vec<GameRecord>>> {
        self.catalog.subscribe()
    }

    pub fn publish_catalog(&self, records: Vec<GameRecord>) {
        self.catalog.send_replace(Arc::new(records));
    }

    /// Latest top-N leaderboard view.
    pub fn leaderboard(&self) -> Arc<Vec<LeaderboardEntry>> {
        self.leaderboard.borrow().clone()
    }

    pub fn publish_leaderboard(&self, entries: Vec<LeaderboardEntry>) {
        self.leaderboard.send_replace(Arc::new(entries));
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    /// Signed-in sessions keyed by bearer token.
    pub fn sessions(&self) -> &DashMap<String, AuthSession> {
        &self.sessions
    }

    /// Time of the last accepted score submission per user id.
    pub fn last_submissions(&self) -> &DashMap<String, Instant> {
        &self.last_submissions
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn buzz(&self) -> &RwLock<BuzzFeed> {
        &self.buzz
    }

    /// Claim the right to seed the remote catalog. Returns `true` only on the first call.
    pub fn claim_seeding(&self) -> bool {
        !self.seeded.swap(true, Ordering::SeqCst)
    }

    /// Give the seeding claim back so the next empty snapshot writes the defaults again.
    pub fn release_seeding(&self) {
        self.seeded.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{document_store::memory::MemoryDocumentStore, keyvalue::MemoryKeyValueStore};

    fn state() -> SharedState {
        AppState::new(AppConfig::default(), Arc::new(MemoryKeyValueStore::new()))
    }

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = state();
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded());
        assert!(state.require_store().await.is_err());

        state.install_store(Arc::new(MemoryDocumentStore::new())).await;
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.clear_store().await;
        assert!(state.is_degraded());
    }

    #[test]
    fn seeding_is_claimed_once() {
        let state = state();
        assert!(state.claim_seeding());
        assert!(!state.claim_seeding());

        state.release_seeding();
        assert!(state.claim_seeding());
    }
}
