//! Configuration file parser for ~/.config/subdeck/config.toml.
//!
//! The config file is optional — a missing or empty file yields
//! `Config::default()`. All fields use `#[serde(default)]` so any subset of
//! keys can be specified.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::util::{validate_base_url, BaseUrlError};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {field} in config file: {source}")]
    BadBaseUrl {
        field: &'static str,
        source: BaseUrlError,
    },
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// Custom `Debug` impl masks `chat_api_key` so the key never leaks into logs
/// or error output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// YouTube Data API base URL. Overridable for tests.
    pub youtube_api_base: String,

    /// Drive API base URL (metadata + reads).
    pub drive_api_base: String,

    /// Drive upload API base URL (content writes).
    pub drive_upload_base: String,

    /// Chat-completions API base URL for the category assistant.
    pub chat_api_base: String,

    /// Model identifier sent to the chat API.
    pub chat_model: String,

    /// API key for the chat assistant (env `SUBDECK_CHAT_API_KEY` wins).
    pub chat_api_key: Option<String>,

    /// Quiescence window before a category change is flushed to Drive.
    pub debounce_ms: u64,

    /// Subscription snapshot cache TTL.
    pub subscriptions_ttl_hours: i64,

    /// Video snapshot cache TTL.
    pub videos_ttl_minutes: i64,

    /// How many recent uploads to pull per channel.
    pub videos_per_channel: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            drive_api_base: "https://www.googleapis.com/drive/v3".to_string(),
            drive_upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
            chat_api_base: "https://openrouter.ai/api/v1".to_string(),
            chat_model: "anthropic/claude-sonnet-4".to_string(),
            chat_api_key: None,
            debounce_ms: 2000,
            subscriptions_ttl_hours: 24,
            videos_ttl_minutes: 30,
            videos_per_channel: 10,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("youtube_api_base", &self.youtube_api_base)
            .field("drive_api_base", &self.drive_api_base)
            .field("drive_upload_base", &self.drive_upload_base)
            .field("chat_api_base", &self.chat_api_base)
            .field("chat_model", &self.chat_model)
            .field(
                "chat_api_key",
                &self.chat_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("debounce_ms", &self.debounce_ms)
            .field("subscriptions_ttl_hours", &self.subscriptions_ttl_hours)
            .field("videos_ttl_minutes", &self.videos_ttl_minutes)
            .field("videos_per_channel", &self.videos_per_channel)
            .finish()
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown keys → silently accepted (serde default behavior)
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate that every configured base URL is http(s) and not a cleartext
    /// remote host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bases = [
            ("youtube_api_base", &self.youtube_api_base),
            ("drive_api_base", &self.drive_api_base),
            ("drive_upload_base", &self.drive_upload_base),
            ("chat_api_base", &self.chat_api_base),
        ];
        for (field, value) in bases {
            validate_base_url(value).map_err(|source| ConfigError::BadBaseUrl { field, source })?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
