use axum::{
    Json,
    http::{StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::{keyvalue::KeyValueError, storage::StorageError};

/// Failures reported by the leaderboard gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No authenticated session identifier was supplied.
    #[error("sign in before submitting a score")]
    Unauthenticated,
    /// The document store is unreachable or not configured.
    #[error("leaderboard unavailable")]
    Unavailable(#[source] Option<StorageError>),
    /// A merge-patch targeted an unknown record.
    #[error("no record `{0}`")]
    NotFound(String),
    /// Malformed score or player name.
    #[error("{0}")]
    Validation(String),
    /// The same player submitted again within the cooldown window.
    #[error("slow down: wait {retry_after_secs}s before submitting again")]
    RateLimited { retry_after_secs: u64 },
}

impl From<StorageError> for GatewayError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { id, .. } => GatewayError::NotFound(id),
            other => GatewayError::Unavailable(Some(other)),
        }
    }
}

/// Failures surfaced by the service layer, independent of transport.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No document store is installed right now.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    #[error("preferences unavailable")]
    Preferences(#[from] KeyValueError),
    /// Missing or unknown session token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limited: retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { collection, id } => {
                ServiceError::NotFound(format!("`{id}` in `{collection}`"))
            }
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthenticated => ServiceError::Unauthorized(err.to_string()),
            GatewayError::Unavailable(Some(source)) => ServiceError::Unavailable(source),
            GatewayError::Unavailable(None) => ServiceError::Degraded,
            GatewayError::NotFound(id) => ServiceError::NotFound(id),
            GatewayError::Validation(message) => ServiceError::InvalidInput(message),
            GatewayError::RateLimited { retry_after_secs } => {
                ServiceError::RateLimited { retry_after_secs }
            }
        }
    }
}

/// Error returned by HTTP handlers, rendered as `{ "message": ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("too many requests: retry in {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Preferences(source) => AppError::Internal(source.to_string()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::RateLimited { retry_after_secs } => {
                AppError::TooManyRequests { retry_after_secs }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "message": self.to_string() }));
        match self {
            AppError::TooManyRequests { retry_after_secs } => {
                (status, [(RETRY_AFTER, retry_after_secs.to_string())], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_map_to_http_statuses() {
        let cases = [
            (GatewayError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (GatewayError::Unavailable(None), StatusCode::SERVICE_UNAVAILABLE),
            (GatewayError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (GatewayError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                GatewayError::RateLimited { retry_after_secs: 2 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(ServiceError::from(err)).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn rate_limited_responses_carry_retry_after() {
        let err = AppError::from(ServiceError::from(GatewayError::RateLimited {
            retry_after_secs: 2,
        }));
        let response = err.into_response();
        assert_eq!(response.headers()[RETRY_AFTER], "2");
    }

    #[test]
    fn storage_not_found_becomes_gateway_not_found() {
        let err = GatewayError::from(StorageError::not_found("games", "abc"));
        assert!(matches!(err, GatewayError::NotFound(id) if id == "abc"));
    }
}
