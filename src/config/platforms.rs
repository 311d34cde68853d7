//! Chat platform credential configuration.
//!
//! Each platform section is optional: a deployment only configures the
//! platforms its tenants can connect. Per-tenant credentials (bot tokens
//! obtained through OAuth) live on the Installation record; this module
//! holds the app-level secrets used to authenticate inbound traffic.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Platform credentials for all supported integrations.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PlatformsConfig {
    /// Slack app credentials (events API signing secret)
    pub slack: Option<SlackConfig>,

    /// Discord relay credentials (shared secret + bot token)
    pub discord: Option<DiscordConfig>,

    /// Telegram bot credentials (long-poll connector)
    pub telegram: Option<TelegramConfig>,
}

impl PlatformsConfig {
    /// Validate configured platform sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(slack) = &self.slack {
            slack.validate()?;
        }
        if let Some(discord) = &self.discord {
            discord.validate()?;
        }
        if let Some(telegram) = &self.telegram {
            telegram.validate()?;
        }
        Ok(())
    }
}

/// Slack app configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    /// Events API signing secret used to verify inbound requests.
    pub signing_secret: SecretString,

    /// Slack Web API base URL (overridable for tests).
    #[serde(default = "default_slack_api")]
    pub api_base_url: String,
}

impl SlackConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.signing_secret.expose_secret().is_empty() {
            return Err(ValidationError::EmptyPlatformSecret("slack.signing_secret"));
        }
        validate_url(&self.api_base_url, "slack.api_base_url")
    }
}

/// Discord relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Shared secret expected in the `X-Threadline-Secret` header.
    pub shared_secret: SecretString,

    /// Discord REST API base URL (overridable for tests).
    #[serde(default = "default_discord_api")]
    pub api_base_url: String,
}

impl DiscordConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.shared_secret.expose_secret().is_empty() {
            return Err(ValidationError::EmptyPlatformSecret("discord.shared_secret"));
        }
        validate_url(&self.api_base_url, "discord.api_base_url")
    }
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token for the long-poll connector.
    pub bot_token: SecretString,

    /// Telegram Bot API base URL (overridable for tests).
    #[serde(default = "default_telegram_api")]
    pub api_base_url: String,

    /// Long-poll hold time in seconds for `getUpdates`.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl TelegramConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bot_token.expose_secret().is_empty() {
            return Err(ValidationError::EmptyPlatformSecret("telegram.bot_token"));
        }
        validate_url(&self.api_base_url, "telegram.api_base_url")
    }
}

fn validate_url(url: &str, field: &'static str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidPlatformUrl(field))
    }
}

fn default_slack_api() -> String {
    "https://slack.com/api".to_string()
}

fn default_discord_api() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}
