use crate::entities::{decode, parse_timestamp, timestamp, Session, SqliteStore, UserRole};
use chrono::{DateTime, Utc};
use std::future::Future;

pub trait SessionStore: Send + Sync + 'static {
    fn create_session(&self, session: &Session) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_session(&self, token: &str) -> impl Future<Output = Result<Option<Session>, sqlx::Error>> + Send;
    fn delete_session(&self, token: &str) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Drop every session that expired at or before `now`; returns how many were removed.
    fn delete_expired_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

impl SessionStore for SqliteStore {
    async fn create_session(&self, session: &Session) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_sessions (token, username, role, expires_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&session.token)
        .bind(&session.username)
        .bind(session.role.as_ref())
        .bind(timestamp(session.expires_at))
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, sqlx::Error> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT token, username, role, expires_at FROM user_sessions WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(token, username, role, expires_at)| {
            Ok(Session {
                token,
                username,
                role: decode::<UserRole>(&role)?,
                expires_at: parse_timestamp(&expires_at, "user_sessions.expires_at")?,
            })
        })
        .transpose()
    }

    async fn delete_session(&self, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_sessions WHERE token = ?1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= ?1")
            .bind(timestamp(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
