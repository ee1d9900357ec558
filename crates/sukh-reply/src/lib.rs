//! Sukh Reply crate - client for the remote reply-generating service.
//!
//! Provides the `ReplyClient` trait consumed by the session controller, the
//! HTTP implementation talking to the chat endpoint, and a scriptable mock
//! for tests and offline development.

pub mod client;
pub mod error;
pub mod mock;

pub use client::{ChatReply, ChatRequest, HttpReplyClient, ReplyClient};
pub use error::ReplyError;
pub use mock::{MockReplyClient, ReplyGate};
