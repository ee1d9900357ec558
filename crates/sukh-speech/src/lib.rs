//! Sukh Speech crate - speech input and output adapters.
//!
//! Wraps the host's speech-recognition and speech-synthesis capabilities
//! behind two small traits. `SpeechInputAdapter` turns one recognition
//! activation into a single transcript; `SpeechOutputAdapter` speaks text
//! with at most one utterance playing at a time.

pub mod command;
pub mod error;
pub mod mock;
pub mod recognition;
pub mod synthesis;

pub use command::CommandSynthesis;
pub use error::{Capability, SpeechError};
pub use mock::{RecordingSynthesis, ScriptedRecognition, SynthesisCall};
pub use recognition::{
    CaptureActivity, RecognitionAlternative, RecognitionEngine, RecognitionEvent,
    RecognitionOptions, SpeechInputAdapter, UnavailableRecognition,
};
pub use synthesis::{
    strip_emoji_codes, SpeechOutputAdapter, SynthesisEngine, UnavailableSynthesis, Utterance,
};
