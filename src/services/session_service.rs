use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{GameRecord, Theme},
    dto::{
        catalog::{GameView, to_views},
        ws::{SessionInboundMessage, SessionOutboundMessage},
    },
    services::auth_service,
    state::{
        AuthSession, SharedState,
        session::{Session, SessionEffect, SessionEvent},
        timers::{HueCycle, IdleGeneration, IdleTimer},
    },
};

const IDLE_MESSAGE: &str = "Still there? There may be a secret code worth trying...";

/// One connected client: its session reducer plus the timers the reducer asks for.
pub struct SessionDriver {
    state: SharedState,
    session: Session,
    auth: Option<AuthSession>,
    idle: IdleTimer,
    hue: HueCycle,
}

impl SessionDriver {
    /// Build the driver over the current catalog and arm the idle timer.
    pub fn new(state: SharedState, idle_notices: mpsc::UnboundedSender<IdleGeneration>) -> Self {
        let config = state.config();
        let session = Session::new(&state.catalog(), Theme::default());
        let mut idle = IdleTimer::new(config.idle_window, idle_notices);
        idle.arm();
        Self {
            session,
            auth: None,
            idle,
            hue: HueCycle::new(config.hue_tick, config.hue_step),
            state,
        }
    }

    /// Messages sent right after the connection opens.
    pub fn greeting(&self) -> Vec<SessionOutboundMessage> {
        vec![
            SessionOutboundMessage::Visible {
                games: to_views(self.session.visible()),
            },
            SessionOutboundMessage::Theme {
                theme: self.session.state().theme,
            },
            SessionOutboundMessage::SecretMode {
                enabled: self.session.secret().secret_mode,
            },
        ]
    }

    pub fn hue_watcher(&self) -> watch::Receiver<u16> {
        self.hue.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn auth(&self) -> Option<&AuthSession> {
        self.auth.as_ref()
    }

    pub async fn handle(&mut self, message: SessionInboundMessage) -> Vec<SessionOutboundMessage> {
        let event = match message {
            SessionInboundMessage::Key { key } => SessionEvent::Key(key),
            SessionInboundMessage::LuckyCharm => SessionEvent::LuckyCharm,
            SessionInboundMessage::Search { term } => SessionEvent::Search(term),
            SessionInboundMessage::Category { id } => SessionEvent::Category(id),
            SessionInboundMessage::Sort { sort } => SessionEvent::Sort(sort),
            SessionInboundMessage::SelectGame { id } => SessionEvent::SelectGame(id),
            SessionInboundMessage::CloseGame => SessionEvent::CloseGame,
            SessionInboundMessage::ToggleSidebar => SessionEvent::ToggleSidebar,
            SessionInboundMessage::ToggleTheme => SessionEvent::ToggleTheme,
            SessionInboundMessage::Identify { token } => return self.identify(&token).await,
            SessionInboundMessage::Unknown => {
                debug!("ignoring unknown session message");
                return Vec::new();
            }
        };
        let effects = self.session.apply(event);
        self.perform(effects).await
    }

    /// Translate an idle notice, dropping it when a newer countdown superseded it.
    pub fn on_idle(&mut self, generation: IdleGeneration) -> Option<SessionOutboundMessage> {
        if !self.idle.is_current(generation) {
            return None;
        }
        self.idle.complete();
        Some(SessionOutboundMessage::Idle {
            message: IDLE_MESSAGE.to_string(),
        })
    }

    pub async fn on_catalog(&mut self, catalog: Arc<Vec<GameRecord>>) -> Vec<SessionOutboundMessage> {
        let effects = self.session.apply(SessionEvent::CatalogReplaced(catalog));
        self.perform(effects).await
    }

    /// Cancel every timer owned by the session.
    pub fn shutdown(&mut self) {
        self.idle.cancel();
        self.hue.stop();
    }

    async fn identify(&mut self, token: &str) -> Vec<SessionOutboundMessage> {
        let Some(auth) = auth_service::resolve(&self.state, token) else {
            return vec![
                SessionOutboundMessage::Auth { user_id: None },
                SessionOutboundMessage::Notification {
                    message: "unknown session token".into(),
                },
            ];
        };

        match self.state.preferences().theme(&auth.user_id).await {
            Ok(theme) => self.session.set_theme(theme),
            Err(err) => warn!(user_id = %auth.user_id, error = %err, "failed to load theme"),
        }
        let user_id = auth.user_id.clone();
        self.auth = Some(auth);
        vec![
            SessionOutboundMessage::Auth {
                user_id: Some(user_id),
            },
            SessionOutboundMessage::Theme {
                theme: self.session.state().theme,
            },
        ]
    }

    async fn perform(&mut self, effects: Vec<SessionEffect>) -> Vec<SessionOutboundMessage> {
        let mut outbound = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                SessionEffect::Visible(games) => outbound.push(SessionOutboundMessage::Visible {
                    games: to_views(games),
                }),
                SessionEffect::SecretMode(enabled) => {
                    if enabled {
                        self.hue.start();
                    } else {
                        self.hue.stop();
                    }
                    info!(enabled, "secret mode toggled");
                    outbound.push(SessionOutboundMessage::SecretMode { enabled });
                }
                SessionEffect::Shuffled => outbound.push(SessionOutboundMessage::Shuffled),
                SessionEffect::Selected(game) => {
                    if game.is_some() {
                        self.count_game_played().await;
                    }
                    outbound.push(SessionOutboundMessage::Selected {
                        game: game.map(GameView::from),
                    });
                }
                SessionEffect::Sidebar(open) => {
                    outbound.push(SessionOutboundMessage::Sidebar { open })
                }
                SessionEffect::Theme(theme) => {
                    if let Some(auth) = &self.auth
                        && let Err(err) = self.state.preferences().set_theme(&auth.user_id, theme).await
                    {
                        warn!(user_id = %auth.user_id, error = %err, "failed to persist theme");
                    }
                    outbound.push(SessionOutboundMessage::Theme { theme });
                }
                SessionEffect::RearmIdle => self.idle.arm(),
                SessionEffect::Notify(message) => {
                    outbound.push(SessionOutboundMessage::Notification { message })
                }
            }
        }
        outbound
    }

    async fn count_game_played(&self) {
        let Some(auth) = &self.auth else {
            return;
        };
        if let Err(err) = self
            .state
            .preferences()
            .increment_games_played(&auth.user_id)
            .await
        {
            warn!(user_id = %auth.user_id, error = %err, "failed to count game played");
        }
    }
}

/// Handle the full lifecycle of one interactive session WebSocket.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let (idle_tx, mut idle_rx) = mpsc::unbounded_channel();
    let mut driver = SessionDriver::new(state.clone(), idle_tx);
    let mut hue = driver.hue_watcher();
    let mut catalog = state.catalog_watcher();
    catalog.mark_unchanged();

    let connection = Uuid::new_v4();
    info!(%connection, "session connected");

    if send_all(&outbound_tx, &driver.greeting()).is_err() {
        driver.shutdown();
        finalize(writer_task, outbound_tx).await;
        return;
    }

    loop {
        let outbound = tokio::select! {
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => match SessionInboundMessage::from_json_str(&text) {
                    Ok(message) => driver.handle(message).await,
                    Err(err) => {
                        warn!(%connection, error = %err, "failed to parse session message");
                        vec![SessionOutboundMessage::Notification {
                            message: "unreadable message".into(),
                        }]
                    }
                },
                Some(Ok(Message::Ping(payload))) => {
                    let _ = outbound_tx.send(Message::Pong(payload));
                    continue;
                }
                Some(Ok(Message::Close(frame))) => {
                    let _ = outbound_tx.send(Message::Close(frame));
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(err)) => {
                    warn!(%connection, error = %err, "websocket error");
                    break;
                }
                None => break,
            },
            Some(generation) = idle_rx.recv() => driver.on_idle(generation).into_iter().collect(),
            Ok(()) = hue.changed() => {
                let angle = *hue.borrow_and_update();
                vec![SessionOutboundMessage::Hue { angle }]
            }
            Ok(()) = catalog.changed() => {
                let records = catalog.borrow_and_update().clone();
                driver.on_catalog(records).await
            }
        };

        if send_all(&outbound_tx, &outbound).is_err() {
            break;
        }
    }

    driver.shutdown();
    info!(%connection, "session disconnected");
    finalize(writer_task, outbound_tx).await;
}

/// Serialize and queue messages. Fails only once the writer has gone away.
fn send_all(
    tx: &mpsc::UnboundedSender<Message>,
    messages: &[SessionOutboundMessage],
) -> Result<(), mpsc::error::SendError<Message>> {
    for message in messages {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, ?message, "failed to serialize session message");
                continue;
            }
        };
        tx.send(Message::Text(payload.into()))?;
    }
    Ok(())
}

async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::{
        catalog::reconcile,
        config::AppConfig,
        dao::{defaults::default_games, keyvalue::MemoryKeyValueStore},
        state::{AppState, konami::KONAMI_SEQUENCE},
    };

    fn state() -> SharedState {
        let state = AppState::new(AppConfig::default(), Arc::new(MemoryKeyValueStore::new()));
        state.publish_catalog(reconcile(None, &default_games()).records);
        state
    }

    fn driver(state: &SharedState) -> (SessionDriver, mpsc::UnboundedReceiver<IdleGeneration>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SessionDriver::new(state.clone(), tx), rx)
    }

    #[tokio::test]
    async fn greeting_shows_the_whole_catalog() {
        let state = state();
        let (driver, _idle) = driver(&state);
        let greeting = driver.greeting();
        let SessionOutboundMessage::Visible { games } = &greeting[0] else {
            panic!("expected visible list first, got {greeting:?}");
        };
        assert_eq!(games.len(), default_games().len());
        assert_eq!(greeting[1], SessionOutboundMessage::Theme { theme: Theme::Dark });
    }

    #[tokio::test(start_paused = true)]
    async fn konami_code_starts_the_hue_cycle() {
        let state = state();
        let (mut driver, _idle) = driver(&state);
        let mut hue = driver.hue_watcher();

        let mut outbound = Vec::new();
        for key in KONAMI_SEQUENCE {
            outbound.extend(
                driver
                    .handle(SessionInboundMessage::Key { key: key.to_string() })
                    .await,
            );
        }
        assert_eq!(outbound, [SessionOutboundMessage::SecretMode { enabled: true }]);

        hue.changed().await.unwrap();
        assert_eq!(*hue.borrow_and_update(), 5);

        driver.shutdown();
        assert_eq!(*hue.borrow(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_notice_fires_once_after_the_window() {
        let state = state();
        let (mut driver, mut idle) = driver(&state);

        let generation = idle.recv().await.unwrap();
        assert!(matches!(
            driver.on_idle(generation),
            Some(SessionOutboundMessage::Idle { .. })
        ));
        assert_eq!(driver.on_idle(generation), None);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_a_game_postpones_the_idle_notice() {
        let state = state();
        let (mut driver, mut idle) = driver(&state);

        sleep(Duration::from_secs(20)).await;
        driver.handle(SessionInboundMessage::CloseGame).await;
        sleep(Duration::from_secs(20)).await;
        assert!(idle.try_recv().is_err());

        let generation = idle.recv().await.unwrap();
        assert!(driver.on_idle(generation).is_some());
    }

    #[tokio::test]
    async fn identified_players_have_games_counted_and_theme_saved() {
        let state = state();
        let session = auth_service::sign_in_anonymous(&state);
        let (mut driver, _idle) = driver(&state);

        let outbound = driver
            .handle(SessionInboundMessage::Identify {
                token: session.token.clone(),
            })
            .await;
        assert_eq!(
            outbound[0],
            SessionOutboundMessage::Auth {
                user_id: Some(session.user_id.clone())
            }
        );

        let id = state.catalog()[0].id.clone();
        let outbound = driver.handle(SessionInboundMessage::SelectGame { id }).await;
        assert!(matches!(
            outbound[0],
            SessionOutboundMessage::Selected { game: Some(_) }
        ));
        driver.handle(SessionInboundMessage::ToggleTheme).await;

        let prefs = state.preferences().load(&session.user_id).await.unwrap();
        assert_eq!(prefs.total_games_played, 1);
        assert_eq!(prefs.theme, Theme::Light);
    }

    #[tokio::test]
    async fn unknown_token_is_reported() {
        let state = state();
        let (mut driver, _idle) = driver(&state);
        let outbound = driver
            .handle(SessionInboundMessage::Identify {
                token: "nope".into(),
            })
            .await;
        assert_eq!(outbound[0], SessionOutboundMessage::Auth { user_id: None });
        assert!(driver.auth().is_none());
    }

    #[tokio::test]
    async fn catalog_updates_refresh_the_visible_list() {
        let state = state();
        let (mut driver, _idle) = driver(&state);
        let mut smaller = state.catalog().as_ref().clone();
        smaller.truncate(3);

        let outbound = driver.on_catalog(Arc::new(smaller)).await;
        assert!(matches!(
            &outbound[..],
            [SessionOutboundMessage::Visible { games }] if games.len() == 3
        ));
    }
}
