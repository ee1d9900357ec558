//! Error types for the session controller.

use sukh_speech::{Capability, SpeechError};

use crate::state::SessionState;

/// Errors reported to callers of the session controller.
///
/// Reply failures never appear here: the controller recovers from them by
/// appending the fallback message.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} is not supported on this host")]
    UnsupportedCapability(Capability),
    #[error("a voice capture is already in progress")]
    CaptureInProgress,
    #[error("voice capture failed: {0}")]
    Capture(#[source] SpeechError),
    #[error("invalid session state transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
}

impl From<SpeechError> for SessionError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Unsupported(capability) => SessionError::UnsupportedCapability(capability),
            other => SessionError::Capture(other),
        }
    }
}
