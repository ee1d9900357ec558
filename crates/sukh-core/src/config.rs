use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SukhError};
use crate::types::{DEFAULT_LOCALE, FALLBACK_REPLY, GREETING};

/// Top-level configuration for the Sukh application.
///
/// Loaded from `~/.sukh/config.toml` by default. Every field has a default,
/// so an empty or missing file yields a working setup pointed at the local
/// reply service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SukhConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl SukhConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SukhConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SukhError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Remote reply service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Full URL of the chat endpoint.
    pub endpoint: String,
    /// Request timeout in seconds. Zero disables the timeout.
    pub timeout_secs: u64,
    /// User-Agent header sent with each request.
    pub user_agent: String,
}

impl ServiceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/chat".to_string(),
            timeout_secs: 30,
            user_agent: format!("sukh/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Speech recognition and synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Locale tag passed to both speech engines.
    pub locale: String,
    /// Whether replies are spoken aloud when the session starts.
    pub output_enabled: bool,
    /// Maximum seconds a single capture may run. Zero waits for the engine.
    pub capture_timeout_secs: u64,
    /// Text-to-speech program and leading arguments. Empty selects a
    /// platform default (`say` on macOS, `espeak-ng` elsewhere).
    pub synthesis_command: Vec<String>,
}

impl VoiceConfig {
    pub fn capture_timeout(&self) -> Option<Duration> {
        (self.capture_timeout_secs > 0).then(|| Duration::from_secs(self.capture_timeout_secs))
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            output_enabled: true,
            capture_timeout_secs: 15,
            synthesis_command: Vec::new(),
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Assistant message that opens every session.
    pub greeting: String,
    /// Assistant message appended when a reply cannot be obtained.
    pub fallback_reply: String,
    /// Capacity of the session event broadcast channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            greeting: GREETING.to_string(),
            fallback_reply: FALLBACK_REPLY.to_string(),
            event_capacity: 64,
        }
    }
}
