//! Speech input: one recognition activation, one transcript.
//!
//! A `RecognitionEngine` reports its lifecycle as a stream of events
//! (`Start`, `Result`, `Error`, `End`). `SpeechInputAdapter::capture` folds
//! that stream into a single future so callers never deal with event
//! registration.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use sukh_core::config::VoiceConfig;
use sukh_core::types::DEFAULT_LOCALE;

use crate::error::{Capability, SpeechError};

// =============================================================================
// Engine-facing types
// =============================================================================

/// One candidate transcription of a recognized phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionAlternative {
    pub transcript: String,
    pub confidence: f32,
}

/// Lifecycle event reported by a recognition engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Audio capture began.
    Start,
    /// Finalized results, each a list of alternatives ordered best first.
    Result(Vec<Vec<RecognitionAlternative>>),
    /// The engine reported a problem. An `End` still follows.
    Error(String),
    /// Capture is over, whether after a result, silence, or a stop request.
    End,
}

impl RecognitionEvent {
    /// A result event carrying a single phrase with a single alternative.
    pub fn transcript(text: impl Into<String>) -> Self {
        RecognitionEvent::Result(vec![vec![RecognitionAlternative {
            transcript: text.into(),
            confidence: 1.0,
        }]])
    }
}

/// Settings for one recognition activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub locale: String,
    /// Keep listening after the first phrase.
    pub continuous: bool,
    /// Emit partial results while the user is still speaking.
    pub interim_results: bool,
}

impl RecognitionOptions {
    /// Single phrase, final results only.
    pub fn single_shot(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            continuous: false,
            interim_results: false,
        }
    }
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self::single_shot(DEFAULT_LOCALE)
    }
}

/// Host speech-recognition capability.
pub trait RecognitionEngine: Send + Sync {
    /// Whether recognition can be used at all on this host.
    fn is_available(&self) -> bool;

    /// Begin one activation. Events for it arrive on the returned channel.
    fn start(
        &self,
        options: &RecognitionOptions,
    ) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, SpeechError>;

    /// Ask the active activation to finish. The engine reports `End` when it has.
    fn stop(&self);
}

/// Engine for hosts without speech recognition.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRecognition;

impl RecognitionEngine for UnavailableRecognition {
    fn is_available(&self) -> bool {
        false
    }

    fn start(
        &self,
        _options: &RecognitionOptions,
    ) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, SpeechError> {
        Err(SpeechError::Unsupported(Capability::Recognition))
    }

    fn stop(&self) {}
}

// =============================================================================
// Adapter
// =============================================================================

/// Capture activity reported to the caller while a capture runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureActivity {
    Started,
    /// The finalized transcript, reported as soon as the engine delivers it.
    Transcript(String),
    Ended,
}

#[derive(Debug, Default)]
struct CaptureProgress {
    active: bool,
    transcript: Option<String>,
    error: Option<String>,
}

/// Single-shot speech-to-text over a `RecognitionEngine`.
///
/// Holds no state between captures. Rejecting a second concurrent capture
/// is the caller's job.
#[derive(Clone)]
pub struct SpeechInputAdapter {
    engine: Arc<dyn RecognitionEngine>,
    options: RecognitionOptions,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for SpeechInputAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechInputAdapter")
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .field("available", &self.engine.is_available())
            .finish()
    }
}

impl SpeechInputAdapter {
    pub fn new(engine: Arc<dyn RecognitionEngine>, options: RecognitionOptions) -> Self {
        Self {
            engine,
            options,
            timeout: None,
        }
    }

    /// Adapter using the locale and capture timeout from `[voice]`.
    pub fn from_config(engine: Arc<dyn RecognitionEngine>, config: &VoiceConfig) -> Self {
        Self::new(engine, RecognitionOptions::single_shot(config.locale.clone()))
            .with_timeout(config.capture_timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn options(&self) -> &RecognitionOptions {
        &self.options
    }

    /// Capability check, done before any capture starts.
    pub fn is_supported(&self) -> bool {
        self.engine.is_available()
    }

    /// Ask the engine to end the active capture early.
    pub fn stop(&self) {
        self.engine.stop();
    }

    /// Run one capture to completion.
    ///
    /// `on_activity` sees `Started` when the engine reports start,
    /// `Transcript` as soon as the first result arrives, and `Ended` once the
    /// engine is done. Resolves after the end to the first alternative of the
    /// first result, or `None` if the capture ended without one.
    pub async fn capture<F>(&self, mut on_activity: F) -> Result<Option<String>, SpeechError>
    where
        F: FnMut(CaptureActivity) + Send,
    {
        if !self.is_supported() {
            return Err(SpeechError::Unsupported(Capability::Recognition));
        }

        let capture_id = Uuid::new_v4();
        let mut events = self.engine.start(&self.options)?;
        tracing::debug!(capture_id = %capture_id, locale = %self.options.locale, "Speech capture requested");

        let mut progress = CaptureProgress::default();
        let finished = match self.timeout {
            Some(limit) => tokio::time::timeout(
                limit,
                drive(&mut events, &mut on_activity, &mut progress),
            )
            .await
            .is_ok(),
            None => {
                drive(&mut events, &mut on_activity, &mut progress).await;
                true
            }
        };

        if !finished {
            tracing::warn!(capture_id = %capture_id, "Speech capture timed out, stopping engine");
            self.engine.stop();
        }
        if progress.active {
            on_activity(CaptureActivity::Ended);
        }

        match (progress.transcript, progress.error) {
            (Some(text), _) => {
                tracing::info!(capture_id = %capture_id, text_len = text.len(), "Speech captured");
                Ok(Some(text))
            }
            (None, _) if !finished => Err(SpeechError::Timeout(self.timeout.unwrap_or_default())),
            (None, Some(error)) => Err(SpeechError::Engine(error)),
            (None, None) => {
                tracing::debug!(capture_id = %capture_id, "Speech capture ended without a result");
                Ok(None)
            }
        }
    }
}

/// Consume events until `End` or until the engine drops its sender.
async fn drive<F>(
    events: &mut mpsc::UnboundedReceiver<RecognitionEvent>,
    on_activity: &mut F,
    progress: &mut CaptureProgress,
) where
    F: FnMut(CaptureActivity),
{
    while let Some(event) = events.recv().await {
        match event {
            RecognitionEvent::Start => {
                if !progress.active {
                    progress.active = true;
                    on_activity(CaptureActivity::Started);
                }
            }
            RecognitionEvent::Result(results) => {
                if progress.transcript.is_some() {
                    continue;
                }
                let best = results
                    .first()
                    .and_then(|alternatives| alternatives.first());
                if let Some(best) = best {
                    tracing::debug!(confidence = best.confidence, "Recognition result");
                    progress.transcript = Some(best.transcript.clone());
                    on_activity(CaptureActivity::Transcript(best.transcript.clone()));
                }
            }
            RecognitionEvent::Error(error) => {
                tracing::debug!(error = %error, "Recognition engine error");
                progress.error = Some(error);
            }
            RecognitionEvent::End => {
                if progress.active {
                    progress.active = false;
                    on_activity(CaptureActivity::Ended);
                }
                break;
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
