//! Platform adapter registry.
//!
//! Built once at startup from configuration; resolves the adapter for a
//! tenant's active installation from the closed [`Platform`] set instead
//! of re-dispatching on platform names per call.

use std::sync::Arc;

use crate::config::PlatformsConfig;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::installation::Platform;
use crate::ports::PlatformAdapter;

use super::discord::DiscordAdapter;
use super::slack::SlackAdapter;
use super::telegram::TelegramAdapter;

/// The set of adapters this deployment has credentials for.
#[derive(Clone, Default)]
pub struct PlatformAdapters {
    slack: Option<Arc<SlackAdapter>>,
    discord: Option<Arc<DiscordAdapter>>,
    telegram: Option<Arc<TelegramAdapter>>,
}

impl PlatformAdapters {
    /// Build adapters for every configured platform section.
    pub fn from_config(config: &PlatformsConfig) -> Self {
        Self {
            slack: config.slack.clone().map(|c| Arc::new(SlackAdapter::new(c))),
            discord: config
                .discord
                .clone()
                .map(|c| Arc::new(DiscordAdapter::new(c))),
            telegram: config
                .telegram
                .clone()
                .map(|c| Arc::new(TelegramAdapter::new(c))),
        }
    }

    /// Resolve the adapter for a platform.
    ///
    /// # Errors
    ///
    /// Returns `InstallationNotFound` when the platform is not configured
    /// in this deployment; an installation for it cannot exist.
    pub fn for_platform(&self, platform: Platform) -> Result<Arc<dyn PlatformAdapter>, DomainError> {
        let adapter: Option<Arc<dyn PlatformAdapter>> = match platform {
            Platform::Slack => self.slack.clone().map(|a| a as Arc<dyn PlatformAdapter>),
            Platform::Discord => self.discord.clone().map(|a| a as Arc<dyn PlatformAdapter>),
            Platform::Telegram => self.telegram.clone().map(|a| a as Arc<dyn PlatformAdapter>),
        };

        adapter.ok_or_else(|| {
            DomainError::new(
                ErrorCode::InstallationNotFound,
                format!("platform {} is not configured", platform),
            )
        })
    }

    /// The Telegram adapter, when configured; the connector needs the
    /// concrete type for its poll loop.
    pub fn telegram(&self) -> Option<Arc<TelegramAdapter>> {
        self.telegram.clone()
    }

    /// Whether the Slack hook route should be mounted.
    pub fn has_slack(&self) -> bool {
        self.slack.is_some()
    }

    /// Whether the Discord hook route should be mounted.
    pub fn has_discord(&self) -> bool {
        self.discord.is_some()
    }
}
