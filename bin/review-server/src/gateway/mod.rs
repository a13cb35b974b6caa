//! Model gateway: the boundary to the external LLM inference service.
//!
//! The orchestrator only sees [`ModelGateway`]; [`ollama::OllamaGateway`] is
//! the production implementation.

pub mod ollama;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ollama::OllamaGateway;

/// Role of a message in a gateway exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f32,
}

/// One request/response call to a named model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: SamplingOptions,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("gateway error: {0}")]
    Other(String),
}

/// Opaque request/response access to a locally hosted model.
#[async_trait]
pub trait ModelGateway: Send + Sync + std::fmt::Debug + 'static {
    /// Run one chat exchange.  `Ok(None)` means the model answered without
    /// any content.
    async fn chat(&self, request: ChatRequest) -> Result<Option<String>, GatewayError>;
}
