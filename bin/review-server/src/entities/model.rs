use crate::entities::{parse_timestamp, timestamp, LlmModel, SqliteStore};
use chrono::Utc;
use std::future::Future;

type ModelRow = (i64, String, String, String, String);

pub trait ModelStore: Send + Sync + 'static {
    /// Look a model reference up by the identifier the gateway understands.
    fn find_model(&self, model: &str) -> impl Future<Output = Result<Option<LlmModel>, sqlx::Error>> + Send;
    fn list_models(&self) -> impl Future<Output = Result<Vec<LlmModel>, sqlx::Error>> + Send;
    /// Update the record with `id` in place when it exists, otherwise insert a
    /// new one.
    fn upsert_model(
        &self,
        id: Option<i64>,
        name: &str,
        model: &str,
    ) -> impl Future<Output = Result<LlmModel, sqlx::Error>> + Send;
}

fn from_row((id, name, model, created_at, updated_at): ModelRow) -> Result<LlmModel, sqlx::Error> {
    Ok(LlmModel {
        id,
        name,
        model,
        created_at: parse_timestamp(&created_at, "llm_models.created_at")?,
        updated_at: parse_timestamp(&updated_at, "llm_models.updated_at")?,
    })
}

impl ModelStore for SqliteStore {
    async fn find_model(&self, model: &str) -> Result<Option<LlmModel>, sqlx::Error> {
        let row: Option<ModelRow> = sqlx::query_as(
            "SELECT id, name, model, created_at, updated_at FROM llm_models WHERE model = ?1",
        )
        .bind(model)
        .fetch_optional(&self.pool)
        .await?;
        row.map(from_row).transpose()
    }

    async fn list_models(&self) -> Result<Vec<LlmModel>, sqlx::Error> {
        let rows: Vec<ModelRow> =
            sqlx::query_as("SELECT id, name, model, created_at, updated_at FROM llm_models")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(from_row).collect()
    }

    async fn upsert_model(&self, id: Option<i64>, name: &str, model: &str) -> Result<LlmModel, sqlx::Error> {
        let now = timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        let mut target = None;
        if let Some(id) = id {
            let updated = sqlx::query(
                "UPDATE llm_models SET name = ?1, model = ?2, updated_at = ?3 WHERE id = ?4",
            )
            .bind(name)
            .bind(model)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 1 {
                target = Some(id);
            }
        }

        let id = match target {
            Some(id) => id,
            None => sqlx::query(
                "INSERT INTO llm_models (name, model, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            )
            .bind(name)
            .bind(model)
            .bind(&now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
        };

        let row: ModelRow = sqlx::query_as(
            "SELECT id, name, model, created_at, updated_at FROM llm_models WHERE id = ?1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        from_row(row)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::memory_store;

    #[tokio::test]
    async fn upsert_without_id_inserts() {
        let store = memory_store().await;
        let created = store.upsert_model(None, "Qwen coder", "qwen2.5-coder:0.5b").await.unwrap();

        let found = store.find_model("qwen2.5-coder:0.5b").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "Qwen coder");
        assert!(store.find_model("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_with_known_id_updates_in_place() {
        let store = memory_store().await;
        let created = store.upsert_model(None, "old", "m1").await.unwrap();
        let updated = store.upsert_model(Some(created.id), "new", "m2").await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "new");
        assert_eq!(updated.model, "m2");
        assert_eq!(store.list_models().await.unwrap().len(), 1);
        assert!(store.find_model("m1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_with_unknown_id_inserts() {
        let store = memory_store().await;
        store.upsert_model(Some(42), "a", "m1").await.unwrap();
        let all = store.list_models().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_ne!(all[0].id, 42);
    }

    #[tokio::test]
    async fn model_identifier_is_unique() {
        let store = memory_store().await;
        store.upsert_model(None, "a", "m1").await.unwrap();
        let err = store.upsert_model(None, "b", "m1").await.unwrap_err();
        assert!(err
            .as_database_error()
            .is_some_and(|e| e.is_unique_violation()));
    }
}
