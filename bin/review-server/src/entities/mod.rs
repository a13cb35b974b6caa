//! Persistence layer.
//!
//! Each concern (users, login sessions, model references, prompt templates,
//! reviews, review messages) has its own store trait so that services can be
//! written against exactly the capabilities they need.  The only
//! implementation is [`SqliteStore`]; to move to another database, implement
//! the traits for a new type and change the concrete type in
//! [`crate::state::AppState`].
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required on this side of the seam.

pub mod dao;
pub mod message;
pub mod model;
pub mod prompt;
pub mod review;
pub mod session;
pub mod user;

pub use dao::{
    LlmModel, MessageRole, NewMessage, NewReview, NewUser, PromptTemplate, Review, ReviewMessage,
    Session, User, UserRole,
};

pub use message::MessageStore;
pub use model::ModelStore;
pub use prompt::PromptStore;
pub use review::ReviewStore;
pub use session::SessionStore;
pub use user::UserStore;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// SQLite-backed store for every record the server persists.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://review.db"`
    /// or `"sqlite::memory:"` for tests.  In-memory databases are pinned to a
    /// single long-lived connection, since every new connection would
    /// otherwise see its own empty database.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Round-trip a trivial query to prove the database is reachable.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Canonical on-disk timestamp format.
///
/// Fixed-width microsecond RFC 3339 in UTC, so that lexical order in SQL
/// equals chronological order.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Read a stored timestamp.  A value that does not parse is a decode error
/// for `column`, like any other corrupt row.
pub(crate) fn parse_timestamp(raw: &str, column: &'static str) -> Result<DateTime<Utc>, sqlx::Error> {
    raw.parse().map_err(|e: chrono::ParseError| sqlx::Error::ColumnDecode {
        index: column.to_owned(),
        source: Box::new(e),
    })
}

pub(crate) fn decode<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = strum::ParseError>,
{
    T::from_str(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[cfg(test)]
impl SqliteStore {
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> SqliteStore {
    SqliteStore::connect("sqlite::memory:")
        .await
        .expect("in-memory store")
}
