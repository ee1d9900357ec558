//! Error types for the reply client.

/// Failure of a single reply request.
///
/// The session controller recovers from every variant the same way, so the
/// distinction exists for logging and for callers that want their own policy.
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    /// The request never produced a usable HTTP response: connection refused,
    /// timeout, I/O error, or a non-2xx status.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The service answered 2xx but the body is not `{"reply": string}`.
    #[error("protocol failure: {0}")]
    Protocol(String),
    /// The HTTP client could not be constructed.
    #[error("client configuration error: {0}")]
    Configuration(String),
}

impl ReplyError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ReplyError::Transport(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, ReplyError::Protocol(_))
    }
}

impl From<reqwest::Error> for ReplyError {
    fn from(err: reqwest::Error) -> Self {
        ReplyError::Transport(err.to_string())
    }
}
