//! HTTP reply client.
//!
//! One utterance in, one reply out. Every call is a single `POST` with no
//! retries; retry policy belongs to the caller.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use sukh_core::config::ServiceConfig;

use crate::error::ReplyError;

/// Request body sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Successful response body from the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Source of replies for the conversation.
///
/// Each call is independent: the service receives no history.
#[async_trait]
pub trait ReplyClient: Send + Sync {
    /// Send one utterance and return the reply text.
    async fn send(&self, utterance: &str) -> Result<String, ReplyError>;
}

/// `ReplyClient` backed by the JSON-over-HTTP chat endpoint.
#[derive(Debug, Clone)]
pub struct HttpReplyClient {
    client: Client,
    endpoint: String,
}

impl HttpReplyClient {
    /// Build a client for the endpoint and timeout in `config`.
    pub fn new(config: &ServiceConfig) -> Result<Self, ReplyError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            ReplyError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyClient for HttpReplyClient {
    async fn send(&self, utterance: &str) -> Result<String, ReplyError> {
        let started = Instant::now();
        let request = ChatRequest {
            message: utterance.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = %status, endpoint = %self.endpoint, "Reply service returned error status");
            return Err(ReplyError::Transport(format!("HTTP error! status: {}", status)));
        }

        let body = response.bytes().await?;
        let parsed: ChatReply = serde_json::from_slice(&body)
            .map_err(|e| ReplyError::Protocol(format!("Invalid reply body: {}", e)))?;

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            reply_len = parsed.reply.len(),
            "Reply received"
        );
        Ok(parsed.reply)
    }
}
