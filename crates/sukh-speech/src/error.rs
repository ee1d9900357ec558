//! Error types for the speech adapters.

use std::fmt;
use std::time::Duration;

/// Host speech capability an adapter depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Recognition,
    Synthesis,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Recognition => write!(f, "speech recognition"),
            Capability::Synthesis => write!(f, "speech synthesis"),
        }
    }
}

/// Errors from the speech adapters and engines.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("{0} is not supported on this host")]
    Unsupported(Capability),
    #[error("speech capture timed out after {0:?}")]
    Timeout(Duration),
    #[error("speech engine error: {0}")]
    Engine(String),
}
