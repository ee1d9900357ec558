//! Conversation session controller.
//!
//! The `SessionController` owns the transcript and every transient flag the
//! rendering layer reads. It runs at most one reply request and at most one
//! voice capture at a time. Mutual exclusion is logical: each gate check and
//! the state change it guards happen under one short lock, before the first
//! suspension point, and no lock is ever held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use sukh_core::config::SessionConfig;
use sukh_core::events::SessionEvent;
use sukh_core::types::{Message, SessionSnapshot};
use sukh_reply::{ReplyClient, ReplyError};
use sukh_speech::{
    CaptureActivity, Capability, RecognitionOptions, SpeechInputAdapter, SpeechOutputAdapter,
    UnavailableRecognition,
};

use crate::error::SessionError;
use crate::state::{SessionState, StateMachine};

/// Why a submission was dropped without touching the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The text was empty or whitespace only.
    Empty,
    /// Another reply is still outstanding.
    AwaitingReply,
}

/// Result of one `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was appended and no request was made.
    Ignored(IgnoreReason),
    /// The service replied and its text was appended.
    Replied,
    /// The request failed and the fallback message was appended.
    Fallback,
}

#[derive(Debug)]
struct SessionInner {
    messages: Vec<Message>,
    pending_input: String,
    state: StateMachine,
    /// Set from the moment a capture is requested until it has fully finished.
    capture_claimed: bool,
    /// Follows the recognition engine's start/end reports.
    is_capturing_speech: bool,
    voice_output_enabled: bool,
}

/// Owner of one conversation.
///
/// Construct once per conversation and share by reference (or `Arc`); there
/// is no global session state.
pub struct SessionController {
    inner: Mutex<SessionInner>,
    reply_client: Arc<dyn ReplyClient>,
    speech_input: SpeechInputAdapter,
    speech_output: SpeechOutputAdapter,
    fallback_reply: String,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("inner", &self.inner)
            .field("speech_input", &self.speech_input)
            .field("speech_output", &self.speech_output)
            .finish()
    }
}

impl SessionController {
    /// Create a session in `Idle`, seeded with the greeting message.
    ///
    /// Speech capabilities default to unavailable; attach real adapters with
    /// `with_speech_input` / `with_speech_output`.
    pub fn new(reply_client: Arc<dyn ReplyClient>, config: &SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let greeting = Message::ai(config.greeting.clone());

        Self {
            inner: Mutex::new(SessionInner {
                messages: vec![greeting],
                pending_input: String::new(),
                state: StateMachine::new(),
                capture_claimed: false,
                is_capturing_speech: false,
                voice_output_enabled: true,
            }),
            reply_client,
            speech_input: SpeechInputAdapter::new(
                Arc::new(UnavailableRecognition),
                RecognitionOptions::default(),
            ),
            speech_output: SpeechOutputAdapter::default(),
            fallback_reply: config.fallback_reply.clone(),
            events,
        }
    }

    pub fn with_speech_input(mut self, adapter: SpeechInputAdapter) -> Self {
        self.speech_input = adapter;
        self
    }

    pub fn with_speech_output(mut self, adapter: SpeechOutputAdapter) -> Self {
        self.speech_output = adapter;
        self
    }

    /// Set the initial state of the voice-output toggle.
    pub fn with_voice_output(mut self, enabled: bool) -> Self {
        self.inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .voice_output_enabled = enabled;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            messages: inner.messages.clone(),
            pending_input: inner.pending_input.clone(),
            is_awaiting_reply: inner.state.current() == SessionState::AwaitingReply,
            is_capturing_speech: inner.is_capturing_speech,
            voice_output_enabled: inner.voice_output_enabled,
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.current()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state() == SessionState::AwaitingReply
    }

    pub fn is_capturing_speech(&self) -> bool {
        self.lock().is_capturing_speech
    }

    pub fn pending_input(&self) -> String {
        self.lock().pending_input.clone()
    }

    pub fn voice_output_enabled(&self) -> bool {
        self.lock().voice_output_enabled
    }

    pub fn speech_output(&self) -> &SpeechOutputAdapter {
        &self.speech_output
    }

    // =========================================================================
    // Input box and toggles
    // =========================================================================

    /// Replace the pending input, as when the user edits the input box.
    pub fn set_pending_input(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut inner = self.lock();
            if inner.pending_input == text {
                return;
            }
            inner.pending_input = text.clone();
        }
        self.emit(SessionEvent::PendingInputChanged { text });
    }

    /// Flip voice output and return the new setting.
    ///
    /// A request already in flight keeps the setting it was submitted with.
    pub fn toggle_voice_output(&self) -> bool {
        let enabled = {
            let mut inner = self.lock();
            inner.voice_output_enabled = !inner.voice_output_enabled;
            inner.voice_output_enabled
        };
        tracing::info!(enabled, "Voice output toggled");
        self.emit(SessionEvent::VoiceOutputToggled { enabled });
        enabled
    }

    // =========================================================================
    // Reply cycle
    // =========================================================================

    /// Send one utterance and append the outcome.
    ///
    /// Ignored without any state change if `text` is blank or a reply is
    /// already outstanding. Otherwise appends the user message, clears the
    /// pending input, and moves to `AwaitingReply` before suspending; once the
    /// reply client settles, appends exactly one assistant message (the reply
    /// or the fallback) and returns to `Idle`. Reply failures are recovered
    /// here and never returned.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let cycle = match self.begin_reply_cycle(text) {
            Ok(cycle) => cycle,
            Err(reason) => {
                tracing::debug!(?reason, "Submission ignored");
                return SubmitOutcome::Ignored(reason);
            }
        };

        let result = self.reply_client.send(text).await;
        cycle.settle(result)
    }

    /// Submit whatever is in the pending input.
    pub async fn submit_pending(&self) -> SubmitOutcome {
        let text = self.pending_input();
        self.submit(&text).await
    }

    fn begin_reply_cycle(&self, text: &str) -> Result<ReplyCycle<'_>, IgnoreReason> {
        let mut events = Vec::with_capacity(3);
        let speak_reply = {
            let mut inner = self.lock();
            if text.trim().is_empty() {
                return Err(IgnoreReason::Empty);
            }
            if inner.state.transition(SessionState::AwaitingReply).is_err() {
                return Err(IgnoreReason::AwaitingReply);
            }

            let message = Message::user(text);
            inner.messages.push(message.clone());
            events.push(SessionEvent::MessageAppended {
                index: inner.messages.len() - 1,
                message,
            });
            if !inner.pending_input.is_empty() {
                inner.pending_input.clear();
                events.push(SessionEvent::PendingInputChanged {
                    text: String::new(),
                });
            }
            events.push(SessionEvent::awaiting_reply(true));
            inner.voice_output_enabled
        };

        for event in events {
            self.emit(event);
        }
        tracing::info!(utterance_len = text.len(), "Utterance submitted");

        Ok(ReplyCycle {
            controller: self,
            speak_reply,
            settled: false,
        })
    }

    fn finish_reply_cycle(
        &self,
        result: Result<String, ReplyError>,
        speak_reply: bool,
    ) -> SubmitOutcome {
        let (outcome, text) = match result {
            Ok(reply) => (SubmitOutcome::Replied, reply),
            Err(e) => {
                tracing::warn!(error = %e, "Error fetching reply, appending fallback");
                (SubmitOutcome::Fallback, self.fallback_reply.clone())
            }
        };

        let appended = {
            let mut inner = self.lock();
            let message = Message::ai(text.clone());
            inner.messages.push(message.clone());
            if let Err(e) = inner.state.transition(SessionState::Idle) {
                tracing::error!(error = %e, "Reply settled outside a reply cycle");
            }
            SessionEvent::MessageAppended {
                index: inner.messages.len() - 1,
                message,
            }
        };
        self.emit(appended);

        if outcome == SubmitOutcome::Replied && speak_reply {
            self.speech_output.speak(&text);
        }
        self.emit(SessionEvent::awaiting_reply(false));
        outcome
    }

    // =========================================================================
    // Voice capture
    // =========================================================================

    /// Capture one spoken phrase into the pending input.
    ///
    /// Fails with `UnsupportedCapability` before touching any state when the
    /// host has no speech recognition, and with `CaptureInProgress` while
    /// another capture is active. The transcript is placed in the pending
    /// input as soon as the engine delivers it, but never submitted.
    pub async fn begin_voice_capture(&self) -> Result<Option<String>, SessionError> {
        if !self.speech_input.is_supported() {
            tracing::info!("Speech recognition not supported on this host");
            return Err(SessionError::UnsupportedCapability(Capability::Recognition));
        }

        let claim = self.claim_capture()?;
        let result = self
            .speech_input
            .capture(|activity| match activity {
                CaptureActivity::Started => self.set_capturing(true),
                CaptureActivity::Transcript(text) => self.set_pending_input(text),
                CaptureActivity::Ended => self.set_capturing(false),
            })
            .await;
        claim.release();

        match result {
            Ok(transcript) => Ok(transcript),
            Err(e) => {
                tracing::warn!(error = %e, "Voice capture failed");
                Err(e.into())
            }
        }
    }

    /// Ask the active capture, if any, to end now.
    pub fn stop_voice_capture(&self) {
        if self.lock().capture_claimed {
            self.speech_input.stop();
        }
    }

    fn claim_capture(&self) -> Result<CaptureClaim<'_>, SessionError> {
        let mut inner = self.lock();
        if inner.capture_claimed {
            return Err(SessionError::CaptureInProgress);
        }
        inner.capture_claimed = true;
        Ok(CaptureClaim {
            controller: self,
            released: false,
        })
    }

    fn set_capturing(&self, capturing: bool) {
        let changed = {
            let mut inner = self.lock();
            let changed = inner.is_capturing_speech != capturing;
            inner.is_capturing_speech = capturing;
            changed
        };
        if changed {
            tracing::debug!(capturing, "Speech capture activity");
            self.emit(SessionEvent::capturing_speech(capturing));
        }
    }

    fn release_capture(&self, abandoned: bool) {
        {
            let mut inner = self.lock();
            inner.capture_claimed = false;
        }
        if abandoned {
            tracing::warn!("Voice capture abandoned, stopping recognition");
            self.speech_input.stop();
        }
        self.set_capturing(false);
    }
}

/// An in-flight reply request. Settles the session even if the owning
/// future is dropped before the reply arrives.
struct ReplyCycle<'a> {
    controller: &'a SessionController,
    speak_reply: bool,
    settled: bool,
}

impl ReplyCycle<'_> {
    fn settle(mut self, result: Result<String, ReplyError>) -> SubmitOutcome {
        self.settled = true;
        self.controller.finish_reply_cycle(result, self.speak_reply)
    }
}

impl Drop for ReplyCycle<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Reply request dropped before completion");
            self.controller.finish_reply_cycle(
                Err(ReplyError::Transport("request abandoned".to_string())),
                false,
            );
        }
    }
}

/// Exclusive right to run a capture. Released on drop.
struct CaptureClaim<'a> {
    controller: &'a SessionController,
    released: bool,
}

impl CaptureClaim<'_> {
    fn release(mut self) {
        self.released = true;
        self.controller.release_capture(false);
    }
}

impl Drop for CaptureClaim<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.controller.release_capture(true);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sukh_core::types::{Sender, FALLBACK_REPLY, GREETING};
    use sukh_reply::MockReplyClient;
    use sukh_speech::{RecognitionEvent, RecordingSynthesis, ScriptedRecognition};

    fn controller_with(client: Arc<MockReplyClient>) -> SessionController {
        SessionController::new(client, &SessionConfig::default())
    }

    #[test]
    fn test_new_session_seeded_with_greeting() {
        let controller = controller_with(Arc::new(MockReplyClient::new()));
        let snapshot = controller.snapshot();

        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].text, GREETING);
        assert_eq!(snapshot.messages[0].sender, Sender::Ai);
        assert!(snapshot.pending_input.is_empty());
        assert!(!snapshot.is_awaiting_reply);
        assert!(!snapshot.is_capturing_speech);
        assert!(snapshot.voice_output_enabled);
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_with_voice_output_sets_initial_toggle() {
        let controller =
            controller_with(Arc::new(MockReplyClient::new())).with_voice_output(false);
        assert!(!controller.voice_output_enabled());
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_ai() {
        let client = Arc::new(MockReplyClient::new());
        client.push_reply("Take a deep breath.");
        let controller = controller_with(Arc::clone(&client));

        let outcome = controller.submit("I feel anxious").await;
        assert_eq!(outcome, SubmitOutcome::Replied);

        let messages = controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].text, "I feel anxious");
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[2].text, "Take a deep breath.");
        assert_eq!(messages[2].sender, Sender::Ai);
        assert!(messages[2].timestamp >= messages[1].timestamp);
        assert_eq!(client.received(), vec!["I feel anxious"]);
        assert!(!controller.is_awaiting_reply());
    }

    #[tokio::test]
    async fn test_submit_sends_text_untrimmed() {
        let client = Arc::new(MockReplyClient::new());
        let controller = controller_with(Arc::clone(&client));

        controller.submit("  hi there  ").await;
        assert_eq!(client.received(), vec!["  hi there  "]);
        assert_eq!(controller.messages()[1].text, "  hi there  ");
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        let client = Arc::new(MockReplyClient::new());
        let controller = controller_with(Arc::clone(&client));
        controller.set_pending_input("   ");
        let before = controller.snapshot();

        for text in ["", "   ", "\n\t "] {
            let outcome = controller.submit(text).await;
            assert_eq!(outcome, SubmitOutcome::Ignored(IgnoreReason::Empty));
        }

        assert_eq!(controller.snapshot(), before);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_appends_fallback_and_returns_to_idle() {
        let client = Arc::new(MockReplyClient::new());
        client.push_error(ReplyError::Transport("HTTP error! status: 500".to_string()));
        let controller = controller_with(Arc::clone(&client));

        let outcome = controller.submit("hello").await;
        assert_eq!(outcome, SubmitOutcome::Fallback);

        let messages = controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text, FALLBACK_REPLY);
        assert_eq!(messages[2].sender, Sender::Ai);
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_submit_clears_pending_input() {
        let controller = controller_with(Arc::new(MockReplyClient::new()));
        controller.set_pending_input("typed text");

        controller.submit_pending().await;

        assert!(controller.pending_input().is_empty());
        assert_eq!(controller.messages()[1].text, "typed text");
    }

    #[tokio::test]
    async fn test_second_submit_while_awaiting_is_ignored() {
        let (client, gate) = MockReplyClient::gated();
        client.push_reply("first reply");
        let client = Arc::new(client);
        let controller = Arc::new(controller_with(Arc::clone(&client)));

        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit("first").await })
        };
        while !controller.is_awaiting_reply() {
            tokio::task::yield_now().await;
        }

        let before = controller.snapshot();
        let outcome = controller.submit("second").await;
        assert_eq!(outcome, SubmitOutcome::Ignored(IgnoreReason::AwaitingReply));
        assert_eq!(controller.snapshot(), before);

        gate.release();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Replied);
        assert_eq!(client.received(), vec!["first"]);
        assert_eq!(controller.message_count(), 3);
    }

    #[tokio::test]
    async fn test_dropped_submit_still_settles() {
        let (client, _gate) = MockReplyClient::gated();
        let controller = controller_with(Arc::new(client));

        {
            let submit = controller.submit("never answered");
            tokio::pin!(submit);
            let polled = futures_poll_once(submit.as_mut()).await;
            assert!(polled.is_none());
            assert!(controller.is_awaiting_reply());
        }

        assert!(!controller.is_awaiting_reply());
        let messages = controller.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text, FALLBACK_REPLY);
    }

    /// Poll a future exactly once.
    async fn futures_poll_once<F: std::future::Future + Unpin>(fut: F) -> Option<F::Output> {
        let mut fut = fut;
        std::future::poll_fn(|cx| {
            std::task::Poll::Ready(match std::future::Future::poll(std::pin::Pin::new(&mut fut), cx) {
                std::task::Poll::Ready(out) => Some(out),
                std::task::Poll::Pending => None,
            })
        })
        .await
    }

    #[tokio::test]
    async fn test_reply_spoken_when_voice_enabled() {
        let synth = Arc::new(RecordingSynthesis::new());
        let client = Arc::new(MockReplyClient::new());
        client.push_reply("Great :smile: job");
        let controller = controller_with(client)
            .with_speech_output(SpeechOutputAdapter::new(synth.clone(), "en-IN"));

        controller.submit("I finished my run").await;
        assert_eq!(synth.spoken(), vec!["Great  job"]);
        // The transcript keeps the reply exactly as received.
        assert_eq!(controller.messages()[2].text, "Great :smile: job");
    }

    #[tokio::test]
    async fn test_voice_disabled_suppresses_speech() {
        let synth = Arc::new(RecordingSynthesis::new());
        let client = Arc::new(MockReplyClient::new());
        client.push_reply("quiet reply");
        let controller = controller_with(client)
            .with_speech_output(SpeechOutputAdapter::new(synth.clone(), "en-IN"));

        assert!(!controller.toggle_voice_output());
        controller.submit("hello").await;

        assert!(synth.calls().is_empty());
        assert_eq!(controller.messages()[2].text, "quiet reply");
    }

    #[tokio::test]
    async fn test_fallback_is_not_spoken() {
        let synth = Arc::new(RecordingSynthesis::new());
        let client = Arc::new(MockReplyClient::new());
        client.push_error(ReplyError::Protocol("bad body".to_string()));
        let controller = controller_with(client)
            .with_speech_output(SpeechOutputAdapter::new(synth.clone(), "en-IN"));

        assert_eq!(controller.submit("hello").await, SubmitOutcome::Fallback);
        assert!(synth.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_synthesis_still_appends_reply() {
        let synth = Arc::new(RecordingSynthesis::unavailable());
        let client = Arc::new(MockReplyClient::new());
        client.push_reply("text only");
        let controller = controller_with(client)
            .with_speech_output(SpeechOutputAdapter::new(synth.clone(), "en-IN"));

        assert_eq!(controller.submit("hello").await, SubmitOutcome::Replied);
        assert_eq!(controller.messages()[2].text, "text only");
        assert!(synth.calls().is_empty());
        assert!(controller.speech_output().active_utterance().is_none());
    }

    #[tokio::test]
    async fn test_toggle_during_flight_keeps_submitted_setting() {
        let synth = Arc::new(RecordingSynthesis::new());
        let (client, gate) = MockReplyClient::gated();
        client.push_reply("spoken anyway");
        let controller = Arc::new(
            controller_with(Arc::new(client))
                .with_speech_output(SpeechOutputAdapter::new(synth.clone(), "en-IN")),
        );

        let task = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit("hi").await })
        };
        while !controller.is_awaiting_reply() {
            tokio::task::yield_now().await;
        }
        controller.toggle_voice_output();
        gate.release();
        task.await.unwrap();

        assert_eq!(synth.spoken(), vec!["spoken anyway"]);
        assert!(!controller.voice_output_enabled());
    }

    #[tokio::test]
    async fn test_voice_capture_unsupported_leaves_state() {
        let controller = controller_with(Arc::new(MockReplyClient::new()));
        let before = controller.snapshot();

        let err = controller.begin_voice_capture().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnsupportedCapability(Capability::Recognition)
        ));
        assert_eq!(controller.snapshot(), before);
    }

    #[tokio::test]
    async fn test_voice_capture_fills_pending_input_without_submitting() {
        let engine = Arc::new(ScriptedRecognition::new());
        engine.push_script(vec![
            RecognitionEvent::Start,
            RecognitionEvent::transcript("I need a break"),
            RecognitionEvent::End,
        ]);
        let client = Arc::new(MockReplyClient::new());
        let controller = controller_with(Arc::clone(&client)).with_speech_input(
            SpeechInputAdapter::new(engine, RecognitionOptions::default()),
        );

        let transcript = controller.begin_voice_capture().await.unwrap();
        assert_eq!(transcript.as_deref(), Some("I need a break"));
        assert_eq!(controller.pending_input(), "I need a break");
        assert_eq!(controller.message_count(), 1);
        assert_eq!(client.call_count(), 0);
        assert!(!controller.is_capturing_speech());
    }

    #[tokio::test]
    async fn test_transcript_fills_pending_input_before_end() {
        let engine = Arc::new(ScriptedRecognition::new());
        engine.push_script(vec![
            RecognitionEvent::Start,
            RecognitionEvent::transcript("I need a break"),
        ]);
        let controller = Arc::new(
            controller_with(Arc::new(MockReplyClient::new())).with_speech_input(
                SpeechInputAdapter::new(engine.clone(), RecognitionOptions::default()),
            ),
        );

        let capture = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.begin_voice_capture().await })
        };
        while controller.pending_input().is_empty() {
            tokio::task::yield_now().await;
        }

        assert_eq!(controller.pending_input(), "I need a break");
        assert!(controller.is_capturing_speech());
        assert_eq!(controller.message_count(), 1);

        engine.emit(RecognitionEvent::End);
        let transcript = capture.await.unwrap().unwrap();
        assert_eq!(transcript.as_deref(), Some("I need a break"));
        assert!(!controller.is_capturing_speech());
        assert_eq!(controller.pending_input(), "I need a break");
    }

    #[tokio::test]
    async fn test_capturing_flag_follows_engine_events() {
        let engine = Arc::new(ScriptedRecognition::new());
        let controller = Arc::new(
            controller_with(Arc::new(MockReplyClient::new())).with_speech_input(
                SpeechInputAdapter::new(engine.clone(), RecognitionOptions::default()),
            ),
        );

        let capture = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.begin_voice_capture().await })
        };
        while engine.start_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!controller.is_capturing_speech());

        engine.emit(RecognitionEvent::Start);
        while !controller.is_capturing_speech() {
            tokio::task::yield_now().await;
        }

        let err = controller.begin_voice_capture().await.unwrap_err();
        assert!(matches!(err, SessionError::CaptureInProgress));

        controller.stop_voice_capture();
        assert_eq!(capture.await.unwrap().unwrap(), None);
        assert!(!controller.is_capturing_speech());
        assert!(controller.pending_input().is_empty());
    }

    #[tokio::test]
    async fn test_events_published_in_order() {
        let client = Arc::new(MockReplyClient::new());
        client.push_reply("reply");
        let controller = controller_with(client);
        let mut rx = controller.subscribe();

        controller.set_pending_input("hello");
        controller.submit("hello").await;

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event {
                SessionEvent::PendingInputChanged { .. } => "pending",
                SessionEvent::MessageAppended { .. } => "message",
                SessionEvent::AwaitingReplyChanged { .. } => "awaiting",
                _ => "other",
            });
        }
        assert_eq!(
            kinds,
            vec!["pending", "message", "pending", "awaiting", "message", "awaiting"]
        );
    }
}
