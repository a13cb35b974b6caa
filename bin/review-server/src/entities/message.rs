use crate::entities::{decode, parse_timestamp, timestamp, MessageRole, NewMessage, ReviewMessage, SqliteStore};
use chrono::Utc;
use std::future::Future;

pub trait MessageStore: Send + Sync + 'static {
    fn append_message(&self, msg: NewMessage) -> impl Future<Output = Result<ReviewMessage, sqlx::Error>> + Send;
    /// Every message of a review, in no particular order.
    fn list_messages(&self, review_id: i64) -> impl Future<Output = Result<Vec<ReviewMessage>, sqlx::Error>> + Send;
}

impl MessageStore for SqliteStore {
    async fn append_message(&self, msg: NewMessage) -> Result<ReviewMessage, sqlx::Error> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO review_messages (review_id, role, body, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(msg.review_id)
        .bind(msg.role.as_ref())
        .bind(&msg.body)
        .bind(timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(ReviewMessage {
            id: result.last_insert_rowid(),
            review_id: msg.review_id,
            role: msg.role,
            body: msg.body,
            created_at,
        })
    }

    async fn list_messages(&self, review_id: i64) -> Result<Vec<ReviewMessage>, sqlx::Error> {
        let rows: Vec<(i64, i64, String, String, String)> = sqlx::query_as(
            "SELECT id, review_id, role, body, created_at FROM review_messages WHERE review_id = ?1",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, review_id, role, body, created_at)| {
                Ok(ReviewMessage {
                    id,
                    review_id,
                    role: decode::<MessageRole>(&role)?,
                    body,
                    created_at: parse_timestamp(&created_at, "review_messages.created_at")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::{memory_store, NewReview, ReviewStore};

    async fn review(store: &SqliteStore) -> i64 {
        store
            .create_review(NewReview {
                user_id: None,
                code: "fn main() {}".into(),
                title: "New Review".into(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn messages_are_scoped_to_their_review() {
        let store = memory_store().await;
        let first = review(&store).await;
        let second = review(&store).await;

        for (review_id, role, body) in [
            (first, MessageRole::Client, "format this"),
            (first, MessageRole::Assistant, "done"),
            (second, MessageRole::System, "framing"),
        ] {
            store
                .append_message(NewMessage { review_id, role, body: body.into() })
                .await
                .unwrap();
        }

        let mut msgs = store.list_messages(first).await.unwrap();
        msgs.sort_by(ReviewMessage::chronological);
        let roles: Vec<_> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::Client, MessageRole::Assistant]);
        assert_eq!(store.list_messages(second).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_timestamp_fails_the_read() {
        let store = memory_store().await;
        let id = review(&store).await;
        for body in ["first", "second"] {
            store
                .append_message(NewMessage { review_id: id, role: MessageRole::Client, body: body.into() })
                .await
                .unwrap();
        }
        sqlx::query("UPDATE review_messages SET created_at = 'garbage' WHERE body = 'first'")
            .execute(store.pool())
            .await
            .unwrap();

        let err = store.list_messages(id).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::ColumnDecode { .. }));
    }

    #[tokio::test]
    async fn append_requires_existing_review() {
        let store = memory_store().await;
        let err = store
            .append_message(NewMessage {
                review_id: 99,
                role: MessageRole::Client,
                body: "orphan".into(),
            })
            .await
            .unwrap_err();
        assert!(err
            .as_database_error()
            .is_some_and(|e| e.is_foreign_key_violation()));
    }
}
