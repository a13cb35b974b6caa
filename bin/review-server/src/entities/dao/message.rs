use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Who a review message is attributed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MessageRole {
    /// The human reviewer.
    Client,
    /// The model.
    Assistant,
    /// Framing text; never replayed to the model as history.
    System,
}

/// A row in the `review_messages` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewMessage {
    pub id: i64,
    pub review_id: i64,
    pub role: MessageRole,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewMessage {
    /// Conversation order: creation time, then id for messages written in the
    /// same instant.
    pub fn chronological(a: &Self, b: &Self) -> Ordering {
        a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub review_id: i64,
    pub role: MessageRole,
    pub body: String,
}
