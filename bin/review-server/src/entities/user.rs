use crate::entities::{decode, parse_timestamp, timestamp, NewUser, SqliteStore, User, UserRole};
use chrono::Utc;
use std::future::Future;

pub trait UserStore: Send + Sync + 'static {
    fn create_user(&self, user: NewUser) -> impl Future<Output = Result<User, sqlx::Error>> + Send;
    fn find_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, sqlx::Error>> + Send;
}

impl UserStore for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .bind(timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at,
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT id, username, password, role, created_at FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, username, password_hash, role, created_at)| {
            Ok(User {
                id,
                username,
                password_hash,
                role: decode::<UserRole>(&role)?,
                created_at: parse_timestamp(&created_at, "users.created_at")?,
            })
        })
        .transpose()
    }
}
