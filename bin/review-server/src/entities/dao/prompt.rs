use chrono::{DateTime, Utc};

/// A named system-prompt seed in the `prompts` table.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub id: i64,
    pub name: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
