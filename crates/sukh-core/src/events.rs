use serde::{Deserialize, Serialize};

use crate::types::{Message, Timestamp};

/// State changes published by a session for the rendering layer.
///
/// Emitted after the change has been applied. Every event reflects state the
/// controller already holds, so a subscriber that lags or drops events can
/// always recover by taking a fresh snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    /// A message was appended to the transcript.
    MessageAppended { index: usize, message: Message },

    /// A reply request started (`true`) or settled (`false`).
    AwaitingReplyChanged { awaiting: bool, timestamp: Timestamp },

    /// The speech-recognition engine reported start (`true`) or end (`false`).
    CapturingSpeechChanged { capturing: bool, timestamp: Timestamp },

    /// The pending input changed (edited, cleared on send, or filled by a capture).
    PendingInputChanged { text: String },

    /// Voice output was switched on or off.
    VoiceOutputToggled { enabled: bool },
}

impl SessionEvent {
    pub fn awaiting_reply(awaiting: bool) -> Self {
        SessionEvent::AwaitingReplyChanged {
            awaiting,
            timestamp: Timestamp::now(),
        }
    }

    pub fn capturing_speech(capturing: bool) -> Self {
        SessionEvent::CapturingSpeechChanged {
            capturing,
            timestamp: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tagged() {
        let event = SessionEvent::VoiceOutputToggled { enabled: false };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "voice_output_toggled");
        assert_eq!(json["enabled"], false);
    }

    #[test]
    fn test_message_appended_roundtrip() {
        let event = SessionEvent::MessageAppended {
            index: 3,
            message: Message::ai("hello"),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_helper_constructors() {
        match SessionEvent::awaiting_reply(true) {
            SessionEvent::AwaitingReplyChanged { awaiting, .. } => assert!(awaiting),
            other => panic!("unexpected event: {:?}", other),
        }
        match SessionEvent::capturing_speech(false) {
            SessionEvent::CapturingSpeechChanged { capturing, .. } => assert!(!capturing),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
