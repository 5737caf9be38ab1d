use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A merge-patch targeted a document that does not exist.
    #[error("document `{id}` not found in `{collection}`")]
    NotFound { collection: String, id: String },
    /// A stored document could not be decoded into the expected model.
    #[error("malformed document `{id}`: {reason}")]
    Malformed { id: String, reason: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a not-found error for a document in a collection.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        StorageError::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }
}
