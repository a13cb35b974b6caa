//! Access gate.
//!
//! The session cookie is resolved into an explicit [`Session`] before any
//! handler runs.  Guarded routes receive it through request extensions
//! (`Extension<Session>`); a missing session or insufficient role
//! short-circuits with `401 {"error": "Forbidden"}`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::entities::Session;
use crate::error::ServerError;
use crate::services::account;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "review_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any logged-in user.
    Session,
    /// Only sessions carrying the ADMIN role.
    Admin,
}

/// Decide whether `session` may pass a gate requiring `access`.
pub fn authorize(session: Option<Session>, access: Access) -> Result<Session, ServerError> {
    match (session, access) {
        (Some(s), Access::Session) => Ok(s),
        (Some(s), Access::Admin) if s.is_admin() => Ok(s),
        _ => Err(ServerError::forbidden()),
    }
}

/// Extract the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Look up the live session named by the request cookie, if any.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Result<Option<Session>, ServerError> {
    match session_token(headers) {
        Some(token) => account::current_session(state.store.as_ref(), &token).await,
        None => Ok(None),
    }
}

pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{secure}",
        ttl.as_secs()
    )
}

pub fn clear_session_cookie(secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{secure}")
}

async fn gate(state: &AppState, mut req: Request<Body>, next: Next, access: Access) -> Response {
    let session = match resolve_session(state, req.headers()).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };

    match authorize(session, access) {
        Ok(session) => {
            debug!(username = %session.username, role = %session.role, ?access, "access granted");
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(e) => {
            warn!(path = %req.uri().path(), ?access, "access denied");
            e.into_response()
        }
    }
}

/// Reject requests without a live session.
pub async fn require_session(State(state): State<Arc<AppState>>, req: Request<Body>, next: Next) -> Response {
    gate(&state, req, next, Access::Session).await
}

/// Reject requests whose session is not an administrator's.
pub async fn require_admin(State(state): State<Arc<AppState>>, req: Request<Body>, next: Next) -> Response {
    gate(&state, req, next, Access::Admin).await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::UserRole;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn session(role: UserRole) -> Session {
        Session {
            token: "tok".into(),
            username: "alice".into(),
            role,
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn session_gate_needs_a_session() {
        assert!(authorize(Some(session(UserRole::User)), Access::Session).is_ok());
        assert!(matches!(authorize(None, Access::Session), Err(ServerError::Unauthorized(_))));
    }

    #[test]
    fn admin_gate_needs_admin_role() {
        assert!(authorize(Some(session(UserRole::Admin)), Access::Admin).is_ok());
        assert!(authorize(Some(session(UserRole::User)), Access::Admin).is_err());
        assert!(authorize(None, Access::Admin).is_err());
    }

    #[test]
    fn token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; review_session=abc-123"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn empty_or_missing_token_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.append(header::COOKIE, HeaderValue::from_static("review_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookies_are_http_only() {
        let set = session_cookie("abc", Duration::from_secs(60), true);
        assert_eq!(set, "review_session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=60; Secure");
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
