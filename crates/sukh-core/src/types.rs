use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// First message of every session, authored by the assistant.
pub const GREETING: &str = "Hi, I'm Sukh. How can I support your mind today? 🌿";

/// Message appended in place of a reply when the reply service fails.
pub const FALLBACK_REPLY: &str = "Oops! Something went wrong. Please try again later.";

/// Locale tag handed to both speech engines.
pub const DEFAULT_LOCALE: &str = "en-IN";

// =============================================================================
// Enums
// =============================================================================

/// Author of a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Typed or dictated by the person using the app.
    User,
    /// Produced by the reply service, or by the session itself (greeting, fallback).
    Ai,
}

// =============================================================================
// Newtype Wrappers - Temporal
// =============================================================================

/// Unix timestamp in milliseconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0).unwrap_or_default()
    }

    /// Local wall-clock label in `HH:MM` form, as shown beside each message.
    pub fn time_label(&self) -> String {
        self.to_datetime()
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

// =============================================================================
// Transcript
// =============================================================================

/// One entry of the conversation transcript. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: Timestamp,
}

impl Message {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: Timestamp::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Ai)
    }

    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Point-in-time copy of everything the rendering layer reads from a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub pending_input: String,
    pub is_awaiting_reply: bool,
    pub is_capturing_speech: bool,
    pub voice_output_enabled: bool,
}

// =============================================================================
// Tests
// =============================================================================
