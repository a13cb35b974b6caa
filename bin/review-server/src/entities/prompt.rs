use crate::entities::{parse_timestamp, timestamp, PromptTemplate, SqliteStore};
use chrono::Utc;
use std::future::Future;

type PromptRow = (i64, String, String, String, String);

pub trait PromptStore: Send + Sync + 'static {
    fn list_prompts(&self) -> impl Future<Output = Result<Vec<PromptTemplate>, sqlx::Error>> + Send;
    /// Replace the text of the prompt with `id` when it exists, otherwise
    /// insert a new `(name, prompt)` record.  An existing prompt keeps its name.
    fn upsert_prompt(
        &self,
        id: Option<i64>,
        name: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<PromptTemplate, sqlx::Error>> + Send;
}

fn from_row((id, name, prompt, created_at, updated_at): PromptRow) -> Result<PromptTemplate, sqlx::Error> {
    Ok(PromptTemplate {
        id,
        name,
        prompt,
        created_at: parse_timestamp(&created_at, "prompts.created_at")?,
        updated_at: parse_timestamp(&updated_at, "prompts.updated_at")?,
    })
}

impl PromptStore for SqliteStore {
    async fn list_prompts(&self) -> Result<Vec<PromptTemplate>, sqlx::Error> {
        let rows: Vec<PromptRow> =
            sqlx::query_as("SELECT id, name, prompt, created_at, updated_at FROM prompts")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(from_row).collect()
    }

    async fn upsert_prompt(&self, id: Option<i64>, name: &str, prompt: &str) -> Result<PromptTemplate, sqlx::Error> {
        let now = timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        let mut target = None;
        if let Some(id) = id {
            let updated = sqlx::query("UPDATE prompts SET prompt = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(prompt)
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
                "INSERT INTO prompts (name, prompt, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            )
            .bind(name)
            .bind(prompt)
            .bind(&now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
        };

        let row: PromptRow =
            sqlx::query_as("SELECT id, name, prompt, created_at, updated_at FROM prompts WHERE id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        tx.commit().await?;
        from_row(row)
    }
}
