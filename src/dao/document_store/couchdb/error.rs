use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::dao::storage::StorageError;

pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures raised by the CouchDB backend.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("environment variable `{0}` is required for the CouchDB backend")]
    MissingEnvVar(&'static str),
    #[error("could not build the CouchDB HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("{method} {path} could not be sent")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {path} answered {status}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
    },
    #[error("{path} returned an undecodable body")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("no document `{doc_id}` in `{collection}`")]
    MissingDocument { collection: String, doc_id: String },
}

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::MissingDocument { collection, doc_id } => {
                StorageError::not_found(collection, doc_id)
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
