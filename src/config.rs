//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARCADE_HUB_CONFIG_PATH";

/// Immutable runtime configuration shared across the application.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Namespace for the document-store collections.
    pub app_id: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "idle_window_secs")]
    pub idle_window: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "hue_tick_ms")]
    pub hue_tick: Duration,
    pub hue_step: u16,
    pub leaderboard_size: usize,
    pub max_score: u64,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "submission_cooldown_secs")]
    pub submission_cooldown: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "buzz_refresh_secs")]
    pub buzz_refresh: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "buzz_rotate_secs")]
    pub buzz_rotate: Duration,
    /// Pre-shared sign-in tokens mapped to the user id they authenticate as.
    pub custom_tokens: IndexMap<String, String>,
    /// JSON file backing player preferences. Preferences are kept in memory when unset.
    pub preferences_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_id: "arcade-hub".into(),
            idle_window: Duration::from_secs(30),
            hue_tick: Duration::from_millis(50),
            hue_step: 5,
            leaderboard_size: 10,
            max_score: 10_000_000,
            submission_cooldown: Duration::from_secs(2),
            buzz_refresh: Duration::from_secs(300),
            buzz_rotate: Duration::from_secs(8),
            custom_tokens: IndexMap::new(),
            preferences_path: None,
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        app_id = %config.app_id,
                        tokens = config.custom_tokens.len(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "app_id": "demo", "idle_window_secs": 5, "hue_tick_ms": 20,
                 "custom_tokens": { "tok-1": "alice" } }"#,
        )
        .unwrap();

        assert_eq!(config.app_id, "demo");
        assert_eq!(config.idle_window, Duration::from_secs(5));
        assert_eq!(config.hue_tick, Duration::from_millis(20));
        assert_eq!(config.leaderboard_size, 10);
        assert_eq!(config.custom_tokens.get("tok-1").map(String::as_str), Some("alice"));
        assert!(config.preferences_path.is_none());
    }
}
