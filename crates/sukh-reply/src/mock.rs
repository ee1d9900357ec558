//! Scriptable reply client for tests and offline development.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::client::ReplyClient;
use crate::error::ReplyError;

/// Holds replies of a gated `MockReplyClient` until released.
#[derive(Debug, Clone)]
pub struct ReplyGate {
    permits: Arc<Semaphore>,
}

impl ReplyGate {
    /// Let one waiting (or future) request complete.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }
}

/// Mock `ReplyClient` returning queued outcomes in order.
///
/// When the queue is empty it echoes the utterance back, which keeps the
/// terminal app usable without a running reply service.
#[derive(Debug, Default)]
pub struct MockReplyClient {
    script: Mutex<VecDeque<Result<String, ReplyError>>>,
    received: Mutex<Vec<String>>,
    gate: Option<ReplyGate>,
}

impl MockReplyClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose requests stay in flight until the returned gate releases them.
    pub fn gated() -> (Self, ReplyGate) {
        let gate = ReplyGate {
            permits: Arc::new(Semaphore::new(0)),
        };
        let client = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (client, gate)
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) -> &Self {
        self.push(Ok(reply.into()))
    }

    /// Queue a failure.
    pub fn push_error(&self, error: ReplyError) -> &Self {
        self.push(Err(error))
    }

    fn push(&self, outcome: Result<String, ReplyError>) -> &Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
        self
    }

    /// Utterances received so far, in call order.
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.received.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ReplyClient for MockReplyClient {
    async fn send(&self, utterance: &str) -> Result<String, ReplyError> {
        if let Ok(mut received) = self.received.lock() {
            received.push(utterance.to_string());
        }

        if let Some(ref gate) = self.gate {
            if let Ok(permit) = gate.permits.acquire().await {
                permit.forget();
            }
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| Ok(format!("You said: {}", utterance)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_scripted_outcomes_in_order() {
        let client = MockReplyClient::new();
        client
            .push_reply("first")
            .push_error(ReplyError::Transport("HTTP 500".to_string()));

        assert_eq!(client.send("a").await.unwrap(), "first");
        assert!(client.send("b").await.unwrap_err().is_transport());
        assert_eq!(client.received(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_script_echoes() {
        let client = MockReplyClient::new();
        assert_eq!(client.send("hello").await.unwrap(), "You said: hello");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_gated_client_waits_for_release() {
        let (client, gate) = MockReplyClient::gated();
        client.push_reply("done");
        let client = Arc::new(client);

        let task = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.send("hold").await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());
        assert_eq!(client.call_count(), 1);

        gate.release();
        assert_eq!(task.await.unwrap().unwrap(), "done");
    }
}
