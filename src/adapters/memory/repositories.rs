//! In-memory ticket, message, and installation repositories.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{
    DomainError, ErrorCode, InstallationId, MessageId, TenantId, TicketId,
};
use crate::domain::installation::{ChannelConfig, Installation, Platform};
use crate::domain::ticket::{Message, Ticket};
use crate::ports::{InstallationRepository, MessageRepository, TicketRepository};

/// In-memory ticket store.
pub struct InMemoryTicketRepository {
    tickets: RwLock<HashMap<TicketId, Ticket>>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self {
            tickets: RwLock::new(HashMap::new()),
        }
    }

    /// Count of stored tickets (test helper).
    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }
}

impl Default for InMemoryTicketRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn save(&self, ticket: &Ticket) -> Result<(), DomainError> {
        self.tickets.write().await.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    async fn update(&self, ticket: &Ticket) -> Result<(), DomainError> {
        let mut tickets = self.tickets.write().await;
        if !tickets.contains_key(&ticket.id()) {
            return Err(DomainError::new(
                ErrorCode::TicketNotFound,
                format!("Ticket not found: {}", ticket.id()),
            ));
        }
        tickets.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, DomainError> {
        Ok(self.tickets.read().await.get(id).cloned())
    }

    async fn find_by_thread(
        &self,
        platform: Platform,
        external_chat_id: &str,
        thread_ref: &str,
    ) -> Result<Option<Ticket>, DomainError> {
        let tickets = self.tickets.read().await;
        Ok(tickets
            .values()
            .find(|t| {
                t.thread_link().is_some_and(|link| {
                    link.platform == platform
                        && link.external_chat_id == external_chat_id
                        && link.thread_ref == thread_ref
                })
            })
            .cloned())
    }
}

/// In-memory message store.
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
        }
    }

    /// Count of stored messages (test helper).
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Fetch one message by id (test helper).
    pub async fn get(&self, id: &MessageId) -> Option<Message> {
        self.messages.read().await.iter().find(|m| m.id == *id).cloned()
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &Message) -> Result<(), DomainError> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn list_by_ticket(&self, ticket_id: &TicketId) -> Result<Vec<Message>, DomainError> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.ticket_id == *ticket_id)
            .cloned()
            .collect())
    }
}

/// In-memory installation store.
pub struct InMemoryInstallationRepository {
    installations: RwLock<HashMap<InstallationId, Installation>>,
    channels: RwLock<Vec<ChannelConfig>>,
}

impl InMemoryInstallationRepository {
    pub fn new() -> Self {
        Self {
            installations: RwLock::new(HashMap::new()),
            channels: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryInstallationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InstallationRepository for InMemoryInstallationRepository {
    async fn save(&self, installation: &Installation) -> Result<(), DomainError> {
        self.installations
            .write()
            .await
            .insert(installation.id, installation.clone());
        Ok(())
    }

    async fn delete(&self, id: &InstallationId) -> Result<(), DomainError> {
        let removed = self.installations.write().await.remove(id);
        if removed.is_none() {
            return Err(DomainError::new(
                ErrorCode::InstallationNotFound,
                format!("Installation not found: {}", id),
            ));
        }
        // Channel configs cascade.
        self.channels
            .write()
            .await
            .retain(|c| c.installation_id != *id);
        Ok(())
    }

    async fn find_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Installation>, DomainError> {
        Ok(self
            .installations
            .read()
            .await
            .values()
            .find(|i| i.tenant_id == *tenant_id)
            .cloned())
    }

    async fn find_by_workspace(
        &self,
        platform: Platform,
        external_workspace_id: &str,
    ) -> Result<Option<Installation>, DomainError> {
        Ok(self
            .installations
            .read()
            .await
            .values()
            .find(|i| i.platform == platform && i.external_workspace_id == external_workspace_id)
            .cloned())
    }

    async fn save_channel_config(&self, config: &ChannelConfig) -> Result<(), DomainError> {
        self.channels.write().await.push(config.clone());
        Ok(())
    }

    async fn default_channel(
        &self,
        installation_id: &InstallationId,
    ) -> Result<Option<ChannelConfig>, DomainError> {
        Ok(self
            .channels
            .read()
            .await
            .iter()
            .find(|c| c.installation_id == *installation_id && c.is_default)
            .cloned())
    }
}
