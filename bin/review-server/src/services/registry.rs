//! Configuration registry: model references and prompt templates.
//!
//! Mutations are admin-only; the gate is applied by the router, these
//! functions only enforce field rules.

use crate::entities::{LlmModel, ModelStore, PromptStore, PromptTemplate};
use crate::error::ServerError;

/// Create a model reference, or update the one with `id` when it exists.
pub async fn upsert_model_reference<S: ModelStore>(
    store: &S,
    name: &str,
    model: &str,
    id: Option<i64>,
) -> Result<LlmModel, ServerError> {
    if name.trim().is_empty() || model.trim().is_empty() {
        return Err(ServerError::BadRequest("Name and model are required".into()));
    }
    store
        .upsert_model(id, name, model)
        .await
        .map_err(|e| conflict_or(e, format!("model '{model}' is already registered")))
}

/// Create a prompt template, or replace the text of the one with `id` when it
/// exists.
pub async fn upsert_prompt_template<S: PromptStore>(
    store: &S,
    name: &str,
    prompt: &str,
    id: Option<i64>,
) -> Result<PromptTemplate, ServerError> {
    if name.trim().is_empty() || prompt.trim().is_empty() {
        return Err(ServerError::BadRequest("Name and prompt are required".into()));
    }
    store
        .upsert_prompt(id, name, prompt)
        .await
        .map_err(|e| conflict_or(e, format!("prompt '{name}' already exists")))
}

fn conflict_or(e: sqlx::Error, message: String) -> ServerError {
    if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
        ServerError::BadRequest(message)
    } else {
        ServerError::Database(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::memory_store;

    #[tokio::test]
    async fn model_fields_are_required() {
        let store = memory_store().await;
        for (name, model) in [("", "m1"), ("Model", ""), ("  ", "m1")] {
            let err = upsert_model_reference(&store, name, model, None).await.unwrap_err();
            assert!(matches!(err, ServerError::BadRequest(_)));
        }
        assert!(store.list_models().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn model_upsert_updates_known_id() {
        let store = memory_store().await;
        let created = upsert_model_reference(&store, "Qwen", "qwen2.5-coder:0.5b", None).await.unwrap();
        let updated = upsert_model_reference(&store, "Qwen small", "qwen2.5-coder:0.5b", Some(created.id))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Qwen small");
        assert_eq!(store.list_models().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_model_identifier_is_bad_request() {
        let store = memory_store().await;
        upsert_model_reference(&store, "a", "m1", None).await.unwrap();
        let err = upsert_model_reference(&store, "b", "m1", None).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(m) if m.contains("m1")));
    }

    #[tokio::test]
    async fn prompt_fields_are_required() {
        let store = memory_store().await;
        let err = upsert_prompt_template(&store, "name", "", None).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(m) if m == "Name and prompt are required"));
    }

    #[tokio::test]
    async fn prompt_upsert_creates_then_updates() {
        let store = memory_store().await;
        let created = upsert_prompt_template(&store, "formatter", "Format it.", None).await.unwrap();
        upsert_prompt_template(&store, "formatter", "Format it nicely.", Some(created.id))
            .await
            .unwrap();

        let prompts = store.list_prompts().await.unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].prompt, "Format it nicely.");
    }
}
