use thiserror::Error;

/// Top-level error type for the Sukh workspace.
///
/// Covers the concerns shared by every crate: configuration and file I/O.
/// Component crates define their own error enums for the
/// failures specific to them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SukhError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for SukhError {
    fn from(err: toml::de::Error) -> Self {
        SukhError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SukhError {
    fn from(err: toml::ser::Error) -> Self {
        SukhError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Sukh operations.
pub type Result<T> = std::result::Result<T, SukhError>;
