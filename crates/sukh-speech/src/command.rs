//! Speech synthesis through a host text-to-speech program.
//!
//! Each utterance runs one child process with the text as its last argument.
//! Cancelling kills the child. Spawning needs a Tokio runtime.

use std::path::Path;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use tokio::process::{Child, Command};

use sukh_core::config::VoiceConfig;

use crate::error::SpeechError;
use crate::synthesis::{SynthesisEngine, Utterance};

/// `SynthesisEngine` that shells out to a TTS command such as `espeak-ng` or `say`.
#[derive(Debug)]
pub struct CommandSynthesis {
    program: String,
    args: Vec<String>,
    /// Flag placed before the lower-cased locale, e.g. `-v` for espeak-ng.
    locale_flag: Option<String>,
    child: Mutex<Option<Child>>,
}

impl CommandSynthesis {
    pub fn new(program: impl Into<String>, args: Vec<String>, locale_flag: Option<String>) -> Self {
        Self {
            program: program.into(),
            args,
            locale_flag,
            child: Mutex::new(None),
        }
    }

    /// `say` on macOS, `espeak-ng -v <locale>` elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("say", Vec::new(), None)
        } else {
            Self::new("espeak-ng", Vec::new(), Some("-v".to_string()))
        }
    }

    /// Engine from `[voice].synthesis_command`, or the platform default when empty.
    pub fn from_config(config: &VoiceConfig) -> Self {
        match config.synthesis_command.split_first() {
            Some((program, args)) => Self::new(program.clone(), args.to_vec(), None),
            None => Self::platform_default(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the previous utterance's process is still running.
    pub fn is_speaking(&self) -> bool {
        let mut guard = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn build_command(&self, utterance: &Utterance) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(ref flag) = self.locale_flag {
            command.arg(flag).arg(utterance.locale.to_lowercase());
        }
        command
            .arg(&utterance.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl SynthesisEngine for CommandSynthesis {
    fn is_available(&self) -> bool {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file();
        }
        which::which(&self.program).is_ok()
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        let child = self
            .build_command(utterance)
            .spawn()
            .map_err(|e| SpeechError::Engine(format!("Failed to run {}: {}", self.program, e)))?;
        tracing::debug!(program = %self.program, pid = ?child.id(), "TTS process started");

        let mut guard = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut previous) = guard.replace(child) {
            let _ = previous.start_kill();
        }
        Ok(())
    }

    fn cancel(&self) {
        let mut guard = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut child) = guard.take() {
            if matches!(child.try_wait(), Ok(None)) {
                tracing::debug!(program = %self.program, "Cancelling TTS process");
            }
            let _ = child.start_kill();
        }
    }
}
