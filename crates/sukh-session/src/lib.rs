//! Sukh Session crate - the conversation session controller.
//!
//! Owns the transcript and the transient UI flags, drives one reply request
//! at a time through the `{Idle, AwaitingReply}` state machine, and
//! coordinates the speech adapters against the text conversation.

pub mod controller;
pub mod error;
pub mod state;

pub use controller::{IgnoreReason, SessionController, SubmitOutcome};
pub use error::SessionError;
pub use state::{SessionState, StateMachine};
