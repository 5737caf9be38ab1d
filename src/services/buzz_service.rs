//! Rotating promotional messages, optionally refreshed from a remote text generator.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{debug, info, warn};

use crate::{services::sse_events, state::SharedState};

const MAX_MESSAGES: usize = 8;
const MAX_MESSAGE_CHARS: usize = 120;

const PROMPT: &str = "Write eight short, upbeat one-line teasers for a browser arcade with \
    classic games like Snake, 2048, Tetris and Pac-Man. One teaser per line, no numbering.";

const DEFAULT_MESSAGES: [&str; 4] = [
    "New high scores are waiting to be broken.",
    "Feeling lucky? Try a random pick from the catalog.",
    "Classic arcade hits, right in your browser.",
    "Challenge a friend and climb the leaderboard.",
];

/// Failures raised while refreshing the feed.
#[derive(Debug, Error)]
pub enum BuzzError {
    #[cfg(feature = "remote-buzz")]
    #[error("text generator request failed")]
    Request(#[source] reqwest::Error),
    #[error("text generator returned no usable lines")]
    Empty,
}

/// Produces free text for a prompt.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> BoxFuture<'static, Result<String, BuzzError>>;
}

/// Messages on rotation and the one currently shown.
#[derive(Debug, Clone)]
pub struct BuzzFeed {
    messages: Vec<String>,
    index: usize,
}

impl Default for BuzzFeed {
    fn default() -> Self {
        Self {
            messages: DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect(),
            index: 0,
        }
    }
}

impl BuzzFeed {
    pub fn current(&self) -> &str {
        &self.messages[self.index]
    }

    /// Advance to the next message, wrapping around.
    pub fn rotate(&mut self) -> &str {
        self.index = (self.index + 1) % self.messages.len();
        self.current()
    }

    /// Swap in a new message set. An empty set is ignored so the feed never goes blank.
    pub fn replace(&mut self, messages: Vec<String>) -> bool {
        if messages.is_empty() {
            return false;
        }
        self.messages = messages;
        self.index = 0;
        true
    }
}

/// Split generator output into display lines, stripping list markers.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| strip_marker(line.trim()).trim_matches('"').to_string())
        .filter(|line| !line.is_empty() && line.chars().count() <= MAX_MESSAGE_CHARS)
        .take(MAX_MESSAGES)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0
        && let Some(rest) = line[digits..].strip_prefix(['.', ')'])
    {
        return rest.trim_start();
    }
    line
}

/// Generator calling a JSON endpoint that accepts `{prompt}` and answers `{text}`.
#[cfg(feature = "remote-buzz")]
#[derive(Clone)]
pub struct HttpTextGenerator {
    client: reqwest::Client,
    endpoint: Arc<str>,
}

#[cfg(feature = "remote-buzz")]
impl HttpTextGenerator {
    pub fn new(endpoint: impl Into<Arc<str>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Read the endpoint from `BUZZ_ENDPOINT`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("BUZZ_ENDPOINT")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(Self::new)
    }
}

#[cfg(feature = "remote-buzz")]
impl TextGenerator for HttpTextGenerator {
    fn generate(&self, prompt: &str) -> BoxFuture<'static, Result<String, BuzzError>> {
        #[derive(serde::Deserialize)]
        struct Reply {
            text: String,
        }

        let request = self
            .client
            .post(self.endpoint.as_ref())
            .json(&serde_json::json!({ "prompt": prompt }));
        Box::pin(async move {
            let reply: Reply = request
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(BuzzError::Request)?
                .json()
                .await
                .map_err(BuzzError::Request)?;
            Ok(reply.text)
        })
    }
}

/// Ask the generator for a fresh message set. Returns how many messages were installed.
pub async fn refresh(state: &SharedState, generator: &dyn TextGenerator) -> Result<usize, BuzzError> {
    let text = generator.generate(PROMPT).await?;
    let lines = parse_lines(&text);
    let count = lines.len();
    if !state.buzz().write().await.replace(lines) {
        return Err(BuzzError::Empty);
    }
    info!(count, "buzz feed refreshed");
    Ok(count)
}

/// Rotate the feed forever, refreshing it from `generator` when one is configured.
pub async fn run(state: SharedState, generator: Option<Arc<dyn TextGenerator>>) {
    let config = state.config();
    let mut rotate = interval_at(Instant::now() + config.buzz_rotate, config.buzz_rotate);
    let mut refresh_tick = interval(config.buzz_refresh.max(Duration::from_secs(1)));
    refresh_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if generator.is_none() {
        debug!("no text generator configured; rotating built-in messages");
    }

    loop {
        tokio::select! {
            _ = rotate.tick() => {
                let message = state.buzz().write().await.rotate().to_string();
                sse_events::broadcast_buzz(&state, &message);
            }
            _ = refresh_tick.tick(), if generator.is_some() => {
                if let Some(generator) = &generator
                    && let Err(err) = refresh(&state, generator.as_ref()).await
                {
                    warn!(error = %err, "buzz refresh failed; keeping current messages");
                }
            }
        }
    }
}

/// Message currently on display.
pub async fn current(state: &SharedState) -> String {
    state.buzz().read().await.current().to_string()
}
