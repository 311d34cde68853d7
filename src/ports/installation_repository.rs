//! InstallationRepository port - persistence for platform installations.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, InstallationId, TenantId};
use crate::domain::installation::{ChannelConfig, Installation, Platform};

/// Port for storing and resolving platform installations.
#[async_trait]
pub trait InstallationRepository: Send + Sync {
    /// Inserts a new installation (completed connect flow).
    async fn save(&self, installation: &Installation) -> Result<(), DomainError>;

    /// Deletes an installation and its channel configs (disconnect).
    async fn delete(&self, id: &InstallationId) -> Result<(), DomainError>;

    /// The tenant's active installation, if any. Platforms are mutually
    /// exclusive, so there is at most one.
    async fn find_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Installation>, DomainError>;

    /// Resolves which installation owns an external workspace/guild/group.
    /// This is how inbound events are scoped to a tenant.
    async fn find_by_workspace(
        &self,
        platform: Platform,
        external_workspace_id: &str,
    ) -> Result<Option<Installation>, DomainError>;

    /// Adds a channel/topic destination to an installation.
    async fn save_channel_config(&self, config: &ChannelConfig) -> Result<(), DomainError>;

    /// The installation's default destination for new ticket threads.
    async fn default_channel(
        &self,
        installation_id: &InstallationId,
    ) -> Result<Option<ChannelConfig>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn InstallationRepository) {}
}
