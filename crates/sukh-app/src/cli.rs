//! CLI argument definitions for the Sukh terminal client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Sukh - a supportive conversation companion for the terminal.
#[derive(Parser, Debug)]
#[command(name = "sukh", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Chat endpoint URL of the reply service.
    #[arg(short = 'e', long = "endpoint")]
    pub endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Start with voice output switched off.
    #[arg(long = "no-voice")]
    pub no_voice: bool,

    /// Echo replies locally instead of calling the reply service.
    #[arg(long = "offline")]
    pub offline: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SUKH_CONFIG env var > ~/.sukh/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SUKH_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the chat endpoint.
    ///
    /// Priority: --endpoint flag > SUKH_ENDPOINT env var > config file value.
    pub fn resolve_endpoint(&self, config_endpoint: &str) -> String {
        self.resolve_endpoint_with(std::env::var("SUKH_ENDPOINT").ok(), config_endpoint)
    }

    fn resolve_endpoint_with(&self, env_endpoint: Option<String>, config_endpoint: &str) -> String {
        if let Some(ref e) = self.endpoint {
            return e.clone();
        }
        match env_endpoint {
            Some(e) if !e.trim().is_empty() => e,
            _ => config_endpoint.to_string(),
        }
    }

    /// Resolve the log level used when RUST_LOG is unset.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Initial voice-output setting: off if either the flag or the config says so.
    pub fn resolve_voice_output(&self, config_enabled: bool) -> bool {
        config_enabled && !self.no_voice
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".sukh").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sukh").join("config.toml");
    }
    PathBuf::from("config.toml")
}
