//! Installation and channel configuration records.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChannelConfigId, InstallationId, TenantId, Timestamp};

use super::Platform;

/// A tenant's connected credentials and identity for one chat platform.
///
/// Created when the OAuth/deep-link flow completes; deleted on disconnect
/// (channel configs cascade with it). A tenant holds at most one active
/// installation at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installation {
    pub id: InstallationId,
    pub tenant_id: TenantId,
    pub platform: Platform,

    /// Workspace / guild / supergroup identity on the platform side.
    pub external_workspace_id: String,

    /// Bot credential used for outbound posting.
    pub bot_token: String,

    /// The installed bot's own identity on the platform, used to drop
    /// echoes of our own outbound posts.
    pub bot_user_id: String,

    pub created_at: Timestamp,
}

impl Installation {
    /// Creates a new installation for a completed connect flow.
    pub fn new(
        tenant_id: TenantId,
        platform: Platform,
        external_workspace_id: impl Into<String>,
        bot_token: impl Into<String>,
        bot_user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: InstallationId::new(),
            tenant_id,
            platform,
            external_workspace_id: external_workspace_id.into(),
            bot_token: bot_token.into(),
            bot_user_id: bot_user_id.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Whether an inbound author id is this installation's own bot.
    pub fn is_own_bot(&self, author_external_id: &str) -> bool {
        !self.bot_user_id.is_empty() && self.bot_user_id == author_external_id
    }
}

/// A selected default destination within an installation: a channel id or
/// a forum-topic-enabled group id. Exactly one may be marked default per
/// tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: ChannelConfigId,
    pub installation_id: InstallationId,

    /// Channel / group identifier on the platform side.
    pub external_channel_id: String,

    /// Human-readable name shown in the dashboard.
    pub name: String,

    /// Whether new tickets open threads here.
    pub is_default: bool,
}

impl ChannelConfig {
    /// Creates a channel config for a selected destination.
    pub fn new(
        installation_id: InstallationId,
        external_channel_id: impl Into<String>,
        name: impl Into<String>,
        is_default: bool,
    ) -> Self {
        Self {
            id: ChannelConfigId::new(),
            installation_id,
            external_channel_id: external_channel_id.into(),
            name: name.into(),
            is_default,
        }
    }
}
