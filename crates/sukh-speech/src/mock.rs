//! Scriptable speech engines for tests and development.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::error::{Capability, SpeechError};
use crate::recognition::{RecognitionEngine, RecognitionEvent, RecognitionOptions};
use crate::synthesis::{SynthesisEngine, Utterance};

// =============================================================================
// Recognition
// =============================================================================

/// Recognition engine that replays queued event scripts.
///
/// Each `start` consumes one script. The channel stays open afterwards so a
/// test can keep driving the activation with `emit`; `stop` behaves like a
/// real engine and reports `End`.
#[derive(Debug)]
pub struct ScriptedRecognition {
    available: bool,
    scripts: Mutex<VecDeque<Vec<RecognitionEvent>>>,
    current: Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>,
    last_options: Mutex<Option<RecognitionOptions>>,
    close_after_script: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl Default for ScriptedRecognition {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRecognition {
    pub fn new() -> Self {
        Self {
            available: true,
            scripts: Mutex::new(VecDeque::new()),
            current: Mutex::new(None),
            last_options: Mutex::new(None),
            close_after_script: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    /// An engine that reports itself unavailable.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Queue the events delivered by the next `start`.
    pub fn push_script(&self, events: Vec<RecognitionEvent>) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(events);
    }

    /// Drop the sender once a script has been delivered.
    pub fn close_after_script(&self, close: bool) {
        self.close_after_script.store(close, Ordering::SeqCst);
    }

    /// Send an event to the active activation. Returns false if none is listening.
    pub fn emit(&self, event: RecognitionEvent) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|tx| tx.send(event).is_ok())
            .unwrap_or(false)
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<RecognitionOptions> {
        self.last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RecognitionEngine for ScriptedRecognition {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(
        &self,
        options: &RecognitionOptions,
    ) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, SpeechError> {
        if !self.available {
            return Err(SpeechError::Unsupported(Capability::Recognition));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(options.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let script = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_default();
        for event in script {
            let _ = tx.send(event);
        }

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = if self.close_after_script.load(Ordering::SeqCst) {
            None
        } else {
            Some(tx)
        };
        Ok(rx)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = tx.send(RecognitionEvent::End);
        }
    }
}

// =============================================================================
// Synthesis
// =============================================================================

/// A call observed by `RecordingSynthesis`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisCall {
    Cancel,
    Speak(Utterance),
}

/// Synthesis engine that records every call instead of producing audio.
#[derive(Debug)]
pub struct RecordingSynthesis {
    available: bool,
    calls: Mutex<Vec<SynthesisCall>>,
    playing: Mutex<Option<String>>,
    fail_next: AtomicBool,
}

impl Default for RecordingSynthesis {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSynthesis {
    pub fn new() -> Self {
        Self {
            available: true,
            calls: Mutex::new(Vec::new()),
            playing: Mutex::new(None),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Make the next `speak` fail with an engine error.
    pub fn fail_next_speak(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SynthesisCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Texts handed to `speak`, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SynthesisCall::Speak(u) => Some(u.text),
                SynthesisCall::Cancel => None,
            })
            .collect()
    }

    /// Text of the utterance that would currently be audible.
    pub fn now_playing(&self) -> Option<String> {
        self.playing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SynthesisEngine for RecordingSynthesis {
    fn is_available(&self) -> bool {
        self.available
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SynthesisCall::Speak(utterance.clone()));
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SpeechError::Engine("audio device busy".to_string()));
        }
        *self.playing.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(utterance.text.clone());
        Ok(())
    }

    fn cancel(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SynthesisCall::Cancel);
        *self.playing.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
