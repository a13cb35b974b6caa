use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::{LlmModel, MessageRole, PromptTemplate, Review, ReviewMessage};
use crate::error::ServerError;
use crate::schemas::MAX_TEXT_LEN;
use crate::services::review::parse_review_id;

// ── Requests ─────────────────────────────────────────────────────────────────

/// Body of `POST /api/code/new-review`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewReviewRequest {
    #[validate(length(max = MAX_TEXT_LEN, message = "code exceeds the size limit"))]
    pub code: String,
    #[validate(length(min = 1, message = "model is required"))]
    pub model: String,
    #[validate(length(max = MAX_TEXT_LEN, message = "prompt exceeds the size limit"))]
    pub prompt: String,
}

/// A review id as the frontend sends it: a number, or the string taken from
/// the page URL.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ReviewIdInput {
    Number(i64),
    Text(String),
}

impl ReviewIdInput {
    pub fn resolve(&self) -> Result<i64, ServerError> {
        match self {
            ReviewIdInput::Number(id) => Ok(*id),
            ReviewIdInput::Text(raw) => parse_review_id(raw),
        }
    }
}

/// Body of `POST /api/code/follow-up-review`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FollowUpRequest {
    pub review_id: ReviewIdInput,
    #[validate(length(min = 1, message = "model is required"))]
    pub model: String,
    #[validate(length(min = 1, max = MAX_TEXT_LEN, message = "prompt is required and must fit the size limit"))]
    pub prompt: String,
}

/// Body of `POST /api/code/model/update`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpsertModelRequest {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub id: Option<i64>,
}

/// Body of `POST /api/code/prompt/update`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpsertPromptRequest {
    pub name: String,
    #[validate(length(max = MAX_TEXT_LEN, message = "prompt exceeds the size limit"))]
    pub prompt: String,
    #[serde(default)]
    pub id: Option<i64>,
}

// ── Responses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewReviewResponse {
    pub review_id: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    pub code: String,
    pub title: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMessageResponse {
    pub id: i64,
    pub review_id: i64,
    pub role: MessageRole,
    pub body: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMessagesResponse {
    /// Ordered by creation time, then id.
    pub review_messages: Vec<ReviewMessageResponse>,
    pub review: Option<ReviewResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub id: i64,
    pub name: String,
    pub model: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModelsResponse {
    pub models: Vec<ModelResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub id: i64,
    pub name: String,
    pub prompt: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PromptsResponse {
    pub prompts: Vec<PromptResponse>,
}

impl Review {
    pub fn to_response(&self) -> ReviewResponse {
        ReviewResponse {
            id: self.id,
            user_id: self.user_id,
            code: self.code.clone(),
            title: self.title.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

impl ReviewMessage {
    pub fn to_response(&self) -> ReviewMessageResponse {
        ReviewMessageResponse {
            id: self.id,
            review_id: self.review_id,
            role: self.role,
            body: self.body.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

impl LlmModel {
    pub fn to_response(&self) -> ModelResponse {
        ModelResponse {
            id: self.id,
            name: self.name.clone(),
            model: self.model.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl PromptTemplate {
    pub fn to_response(&self) -> PromptResponse {
        PromptResponse {
            id: self.id,
            name: self.name.clone(),
            prompt: self.prompt.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

/// Build the review-messages payload, applying the display order.
pub fn review_messages_response(mut messages: Vec<ReviewMessage>, review: Option<Review>) -> ReviewMessagesResponse {
    messages.sort_by(ReviewMessage::chronological);
    ReviewMessagesResponse {
        review_messages: messages.iter().map(ReviewMessage::to_response).collect(),
        review: review.as_ref().map(Review::to_response),
    }
}
