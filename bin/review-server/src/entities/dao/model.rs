use chrono::{DateTime, Utc};

/// A model reference in the `llm_models` table.
///
/// `model` is the identifier handed to the gateway and is unique; `name` is
/// only for display.
#[derive(Debug, Clone)]
pub struct LlmModel {
    pub id: i64,
    pub name: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
