use std::{env, time::Duration};

use super::error::{CouchDaoError, CouchResult};

/// Connection settings for the CouchDB backend.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    pub credentials: Option<(String, String)>,
    /// How often live subscriptions re-read their collection.
    pub poll_interval: Duration,
}

impl CouchConfig {
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            credentials: None,
            poll_interval: Duration::from_secs(2),
        }
    }

    /// Read `COUCH_BASE_URL` and `COUCH_DB`, plus optional `COUCH_USERNAME`/`COUCH_PASSWORD`
    /// and `COUCH_POLL_SECS`.
    pub fn from_env() -> CouchResult<Self> {
        let required =
            |var: &'static str| env::var(var).map_err(|_| CouchDaoError::MissingEnvVar(var));

        let mut config = Self::new(required("COUCH_BASE_URL")?, required("COUCH_DB")?);
        config.credentials = env::var("COUCH_USERNAME")
            .ok()
            .zip(env::var("COUCH_PASSWORD").ok());
        if let Some(secs) = env::var("COUCH_POLL_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            config.poll_interval = Duration::from_secs(secs.max(1));
        }
        Ok(config)
    }
}
