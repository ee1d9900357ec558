//! Reply-cycle state machine.
//!
//! Enforces the two valid transitions of a session:
//! - Idle -> AwaitingReply (an utterance was submitted)
//! - AwaitingReply -> Idle (the reply or its fallback was appended)

use std::fmt;

use crate::error::SessionError;

/// Whether a reply request is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No request outstanding. New submissions are accepted.
    #[default]
    Idle,
    /// One request is outstanding. New submissions are ignored.
    AwaitingReply,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::AwaitingReply => write!(f, "AwaitingReply"),
        }
    }
}

impl SessionState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Idle, SessionState::AwaitingReply)
                | (SessionState::AwaitingReply, SessionState::Idle)
        )
    }
}

/// Validated holder of the current `SessionState`.
///
/// Not synchronized on its own: the controller keeps it behind the same lock
/// as the transcript so the gate check and the state change are one step.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: SessionState,
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SessionState {
        self.state
    }

    /// Attempt to transition to the target state.
    pub fn transition(&mut self, target: SessionState) -> Result<(), SessionError> {
        if self.state.can_transition_to(&target) {
            tracing::debug!("Session state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.state,
                to: target,
            })
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
