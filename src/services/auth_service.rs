//! Bearer-token sessions: anonymous sign-in, configured custom tokens and sign-out.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::auth::SessionResponse,
    error::ServiceError,
    state::{AuthSession, SharedState},
};

fn open_session(state: &SharedState, user_id: String, anonymous: bool) -> SessionResponse {
    let token = Uuid::new_v4().simple().to_string();
    state.sessions().insert(
        token.clone(),
        AuthSession {
            user_id: user_id.clone(),
            anonymous,
        },
    );
    SessionResponse {
        token,
        user_id,
        anonymous,
    }
}

/// Create a session for a fresh anonymous identity.
pub fn sign_in_anonymous(state: &SharedState) -> SessionResponse {
    let user_id = format!("anon-{}", Uuid::new_v4().simple());
    let session = open_session(state, user_id, true);
    info!(user_id = %session.user_id, "anonymous sign-in");
    session
}

/// Exchange a configured custom token for a session bound to its user id.
pub fn sign_in_with_token(state: &SharedState, token: &str) -> Result<SessionResponse, ServiceError> {
    let Some(user_id) = state.config().custom_tokens.get(token).cloned() else {
        warn!("rejected unknown custom token");
        return Err(ServiceError::Unauthorized("unknown custom token".into()));
    };
    let session = open_session(state, user_id, false);
    info!(user_id = %session.user_id, "custom token sign-in");
    Ok(session)
}

/// Drop the session behind `token`. Returns whether one existed.
pub fn sign_out(state: &SharedState, token: &str) -> bool {
    match state.sessions().remove(token) {
        Some((_, session)) => {
            info!(user_id = %session.user_id, "signed out");
            true
        }
        None => false,
    }
}

pub fn resolve(state: &SharedState, token: &str) -> Option<AuthSession> {
    state.sessions().get(token).map(|entry| entry.value().clone())
}

/// Extract the token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolve the caller's session from request headers, if any.
pub fn session_from_headers(state: &SharedState, headers: &HeaderMap) -> Option<AuthSession> {
    bearer_token(headers).and_then(|token| resolve(state, token))
}
