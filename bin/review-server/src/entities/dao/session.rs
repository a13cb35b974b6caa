use chrono::{DateTime, Utc};

use super::UserRole;

/// A live login session, as stored in `user_sessions` and handed to guarded
/// handlers by the access gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque value carried by the session cookie.
    pub token: String,
    pub username: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
