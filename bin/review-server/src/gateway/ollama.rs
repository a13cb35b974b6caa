//! [`ModelGateway`] backed by Ollama's `/api/chat` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatMessage, ChatRequest, GatewayError, ModelGateway, SamplingOptions};

#[derive(Debug, Clone)]
pub struct OllamaGateway {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct OllamaChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: &'a SamplingOptions,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaReply>,
}

#[derive(Deserialize)]
struct OllamaReply {
    content: Option<String>,
}

impl OllamaGateway {
    /// Build a gateway for the Ollama server at `base_url`.
    ///
    /// Without a `timeout` a call waits for as long as the model takes.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl ModelGateway for OllamaGateway {
    async fn chat(&self, request: ChatRequest) -> Result<Option<String>, GatewayError> {
        let body = OllamaChatBody {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            options: &request.options,
        };

        debug!(model = %request.model, messages = request.messages.len(), "calling ollama");
        let response = self.client.post(self.chat_url()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status: status.as_u16(), body });
        }

        let parsed: OllamaChatResponse = response.json().await?;
        Ok(parsed.message.and_then(|m| m.content))
    }
}
