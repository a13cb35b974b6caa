use chrono::{DateTime, Utc};

/// A row in the `reviews` table: one conversation anchored to the code that
/// was submitted when it started.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: i64,
    /// `None` when the submitting user could not be resolved.
    pub user_id: Option<i64>,
    pub code: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: Option<i64>,
    pub code: String,
    pub title: String,
}
