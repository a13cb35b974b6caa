//! Registration, login and server-side sessions.

use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, SubsecRound, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{NewUser, Session, SessionStore, User, UserRole, UserStore};
use crate::error::ServerError;

/// Hash `password` into an Argon2id PHC string.
pub async fn hash_password(password: &str) -> Result<String, ServerError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ServerError::Internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| ServerError::Internal(format!("password hashing task failed: {e}")))?
}

/// Check `password` against a stored PHC string.  A malformed hash never
/// verifies.
pub async fn verify_password(password: &str, phc: &str) -> Result<bool, ServerError> {
    let password = password.to_owned();
    let phc = phc.to_owned();
    tokio::task::spawn_blocking(move || match PasswordHash::new(&phc) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            false
        }
    })
    .await
    .map_err(|e| ServerError::Internal(format!("password verification task failed: {e}")))
}

fn require_credentials(username: &str, password: &str) -> Result<(), ServerError> {
    if username.is_empty() || password.is_empty() {
        return Err(ServerError::BadRequest("Username and password are required".into()));
    }
    Ok(())
}

/// Create an account and log it in.  `admin` grants the ADMIN role.
pub async fn register<S: UserStore + SessionStore>(
    store: &S,
    username: &str,
    password: &str,
    admin: bool,
    ttl: Duration,
) -> Result<Session, ServerError> {
    require_credentials(username, password)?;
    // Fail before the account exists rather than leaving it without a session.
    session_expiry(ttl)?;

    if store.find_user_by_username(username).await?.is_some() {
        return Err(ServerError::BadRequest("Username or account already registered".into()));
    }

    let user = store
        .create_user(NewUser {
            username: username.to_owned(),
            password_hash: hash_password(password).await?,
            role: if admin { UserRole::Admin } else { UserRole::User },
        })
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                ServerError::BadRequest("Username or account already registered".into())
            } else {
                ServerError::Database(e)
            }
        })?;

    info!(username = %user.username, role = %user.role, "user registered");
    open_session(store, &user, ttl).await
}

/// Verify credentials and open a new session.
pub async fn login<S: UserStore + SessionStore>(
    store: &S,
    username: &str,
    password: &str,
    ttl: Duration,
) -> Result<Session, ServerError> {
    require_credentials(username, password)?;

    let user = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| ServerError::NotFound("User not found".into()))?;

    if !verify_password(password, &user.password_hash).await? {
        return Err(ServerError::Unauthorized("Invalid password".into()));
    }

    open_session(store, &user, ttl).await
}

/// Expiry of a session opened now.  Stored timestamps carry microseconds, so
/// the returned value is truncated to match what a later read yields.
fn session_expiry(ttl: Duration) -> Result<DateTime<Utc>, ServerError> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .map(|at| at.trunc_subsecs(6))
        .ok_or_else(|| ServerError::Internal(format!("session ttl out of range: {}s", ttl.as_secs())))
}

pub async fn open_session<S: SessionStore>(store: &S, user: &User, ttl: Duration) -> Result<Session, ServerError> {
    let session = Session {
        token: Uuid::new_v4().to_string(),
        username: user.username.clone(),
        role: user.role,
        expires_at: session_expiry(ttl)?,
    };
    store.create_session(&session).await?;
    Ok(session)
}

/// Resolve a session token.  Expired sessions are treated as absent and
/// pruned.
pub async fn current_session<S: SessionStore>(store: &S, token: &str) -> Result<Option<Session>, ServerError> {
    let now = Utc::now();
    match store.get_session(token).await? {
        Some(session) if !session.is_expired(now) => Ok(Some(session)),
        Some(_) => {
            let pruned = store.delete_expired_sessions(now).await?;
            info!(pruned, "expired sessions removed");
            Ok(None)
        }
        None => Ok(None),
    }
}

pub async fn logout<S: SessionStore>(store: &S, token: Option<&str>) -> Result<(), ServerError> {
    if let Some(token) = token {
        store.delete_session(token).await?;
    }
    Ok(())
}
