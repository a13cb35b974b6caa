use crate::entities::{parse_timestamp, timestamp, NewReview, Review, SqliteStore};
use chrono::Utc;
use std::future::Future;

pub trait ReviewStore: Send + Sync + 'static {
    fn create_review(&self, review: NewReview) -> impl Future<Output = Result<Review, sqlx::Error>> + Send;
    fn get_review(&self, id: i64) -> impl Future<Output = Result<Option<Review>, sqlx::Error>> + Send;
}

impl ReviewStore for SqliteStore {
    async fn create_review(&self, review: NewReview) -> Result<Review, sqlx::Error> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO reviews (user_id, code, title, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(review.user_id)
        .bind(&review.code)
        .bind(&review.title)
        .bind(timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(Review {
            id: result.last_insert_rowid(),
            user_id: review.user_id,
            code: review.code,
            title: review.title,
            created_at,
        })
    }

    async fn get_review(&self, id: i64) -> Result<Option<Review>, sqlx::Error> {
        let row: Option<(i64, Option<i64>, String, String, String)> = sqlx::query_as(
            "SELECT id, user_id, code, title, created_at FROM reviews WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|(id, user_id, code, title, created_at)| {
            Ok(Review {
                id,
                user_id,
                code,
                title,
                created_at: parse_timestamp(&created_at, "reviews.created_at")?,
            })
        })
        .transpose()
    }
}
