//! Plain-text rendering of session state for the terminal.

use sukh_core::events::SessionEvent;
use sukh_core::types::{Message, Sender};

/// Display name for a message author.
pub fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "You",
        Sender::Ai => "Sukh",
    }
}

/// `[HH:MM] Name: text`
pub fn format_message(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.timestamp.time_label(),
        sender_label(message.sender),
        message.text
    )
}

/// Transcript line for an event, if it has a visible effect.
///
/// User messages are skipped because the terminal already echoes what was typed.
pub fn format_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::MessageAppended { message, .. } if !message.is_from_user() => {
            Some(format_message(message))
        }
        SessionEvent::AwaitingReplyChanged { awaiting: true, .. } => {
            Some("  ... Sukh is typing".to_string())
        }
        SessionEvent::CapturingSpeechChanged { capturing: true, .. } => {
            Some("  ... listening".to_string())
        }
        SessionEvent::PendingInputChanged { text } if !text.is_empty() => {
            Some(format!("  heard: \"{}\" (press Enter to send)", text))
        }
        SessionEvent::VoiceOutputToggled { enabled } => Some(format!(
            "  voice output {}",
            if *enabled { "on" } else { "off" }
        )),
        _ => None,
    }
}
