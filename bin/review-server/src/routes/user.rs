//! Account routes: register, login, logout, session lookup.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::middleware::auth::{clear_session_cookie, resolve_session, session_cookie, session_token};
use crate::schemas::user::{CredentialsRequest, LogoutResponse, SessionInfo, SessionResponse};
use crate::schemas::ValidatedJson;
use crate::services::account;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(register, login, logout, get_session),
    components(schemas(CredentialsRequest, SessionInfo, SessionResponse, LogoutResponse))
)]
pub struct UserApi;

/// Routes nested under `/api/user`.  None of them require a session.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", post(get_session))
}

fn with_session_cookie(state: &AppState, session: &crate::entities::Session) -> Response {
    let cookie = session_cookie(&session.token, state.config.session_ttl, state.config.cookie_secure);
    (
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse { session: SessionInfo::from(session) }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/user/register",
    tag = "user",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Account created and logged in", body = SessionResponse),
        (status = 400, description = "Missing credentials or username taken"),
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> Result<Response, ServerError> {
    let admin = state.config.is_admin_username(&req.username);
    let session = account::register(
        state.store.as_ref(),
        &req.username,
        &req.password,
        admin,
        state.config.session_ttl,
    )
    .await?;
    Ok(with_session_cookie(&state, &session))
}

#[utoipa::path(
    post,
    path = "/api/user/login",
    tag = "user",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid password"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CredentialsRequest>,
) -> Result<Response, ServerError> {
    let session = account::login(state.store.as_ref(), &req.username, &req.password, state.config.session_ttl).await?;
    Ok(with_session_cookie(&state, &session))
}

#[utoipa::path(
    post,
    path = "/api/user/logout",
    tag = "user",
    responses(
        (status = 200, description = "Session cleared", body = LogoutResponse),
    )
)]
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response, ServerError> {
    account::logout(state.store.as_ref(), session_token(&headers).as_deref()).await?;
    Ok((
        [(header::SET_COOKIE, clear_session_cookie(state.config.cookie_secure))],
        Json(LogoutResponse { message: "Logout successful".into() }),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/user/session",
    tag = "user",
    responses(
        (status = 200, description = "Current session, or an empty object", body = SessionResponse),
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = resolve_session(&state, &headers).await?;
    Ok(Json(SessionResponse {
        session: session.as_ref().map(SessionInfo::from).unwrap_or_default(),
    }))
}
