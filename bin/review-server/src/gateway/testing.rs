//! Scripted in-process gateway for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatRequest, GatewayError, ModelGateway};

/// Replays scripted replies in order and records every request it receives.
/// Once the script runs out it answers with `"ok"`.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    replies: Mutex<VecDeque<Result<Option<String>, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, content: &str) -> Self {
        self.push(Ok(Some(content.to_owned())))
    }

    pub fn reply_empty(self) -> Self {
        self.push(Ok(None))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(message.to_owned()))
    }

    fn push(self, reply: Result<Option<String>, String>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for RecordingGateway {
    async fn chat(&self, request: ChatRequest) -> Result<Option<String>, GatewayError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(GatewayError::Other(message)),
            None => Ok(Some("ok".to_owned())),
        }
    }
}
