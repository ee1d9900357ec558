//! Speech output: speak replies aloud, newest utterance wins.

use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use regex::Regex;
use uuid::Uuid;

use sukh_core::config::VoiceConfig;
use sukh_core::types::DEFAULT_LOCALE;

use crate::error::{Capability, SpeechError};

/// `:name:` emoji codes: no whitespace or colons between the delimiters.
static EMOJI_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[^:\s]+:").expect("Invalid emoji code regex"));

/// Remove every `:name:` emoji code, leaving the surrounding text untouched.
pub fn strip_emoji_codes(text: &str) -> String {
    EMOJI_CODE.replace_all(text, "").into_owned()
}

/// A single piece of text queued for synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
    pub locale: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            locale: locale.into(),
        }
    }
}

/// Host speech-synthesis capability.
pub trait SynthesisEngine: Send + Sync {
    fn is_available(&self) -> bool;

    /// Queue an utterance. Returns once playback has been handed off.
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;

    /// Silence whatever is currently playing. A no-op when nothing is.
    fn cancel(&self);
}

/// Engine for hosts without speech synthesis.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableSynthesis;

impl SynthesisEngine for UnavailableSynthesis {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&self, _utterance: &Utterance) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported(Capability::Synthesis))
    }

    fn cancel(&self) {}
}

/// Text-to-speech over a `SynthesisEngine` with one active-utterance slot.
///
/// `speak` cancels, starts, and records the new utterance while holding the
/// slot lock, so of two overlapping calls only the later one keeps playing.
pub struct SpeechOutputAdapter {
    engine: Arc<dyn SynthesisEngine>,
    locale: String,
    active: Mutex<Option<Uuid>>,
}

impl std::fmt::Debug for SpeechOutputAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechOutputAdapter")
            .field("locale", &self.locale)
            .field("active", &self.active)
            .field("available", &self.engine.is_available())
            .finish()
    }
}

impl SpeechOutputAdapter {
    pub fn new(engine: Arc<dyn SynthesisEngine>, locale: impl Into<String>) -> Self {
        Self {
            engine,
            locale: locale.into(),
            active: Mutex::new(None),
        }
    }

    pub fn from_config(engine: Arc<dyn SynthesisEngine>, config: &VoiceConfig) -> Self {
        Self::new(engine, config.locale.clone())
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_available()
    }

    /// Id of the utterance most recently handed to the engine, if any.
    pub fn active_utterance(&self) -> Option<Uuid> {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Speak `text`, preempting any utterance still playing. Fire-and-forget.
    pub fn speak(&self, text: &str) {
        if !self.is_supported() {
            tracing::debug!("Speech synthesis unavailable, reply not spoken");
            return;
        }

        let spoken = strip_emoji_codes(text);
        let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        self.engine.cancel();
        *slot = None;

        if spoken.trim().is_empty() {
            return;
        }

        let utterance = Utterance::new(spoken, self.locale.clone());
        match self.engine.speak(&utterance) {
            Ok(()) => {
                tracing::debug!(utterance_id = %utterance.id, text_len = utterance.text.len(), "Utterance started");
                *slot = Some(utterance.id);
            }
            Err(e) => tracing::warn!(error = %e, "Speech synthesis failed"),
        }
    }

    /// Silence the active utterance, if any.
    pub fn cancel(&self) {
        let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        self.engine.cancel();
        *slot = None;
    }
}

impl Default for SpeechOutputAdapter {
    fn default() -> Self {
        Self::new(Arc::new(UnavailableSynthesis), DEFAULT_LOCALE)
    }
}

// =============================================================================
// Tests
// =============================================================================
