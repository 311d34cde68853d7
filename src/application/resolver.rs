//! Ticket/thread resolver.
//!
//! Maps an external conversation handle to an internal ticket, scoped by
//! installation: the external chat id must belong to a tenant's active
//! installation for that platform before the thread lookup runs, so two
//! tenants with colliding thread-ref values can never cross-resolve.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::installation::{Installation, Platform};
use crate::domain::ticket::Ticket;
use crate::ports::{InstallationRepository, TicketRepository};

/// Resolution result: the owning installation, and the ticket when one
/// is linked to the thread.
pub struct Resolution {
    pub installation: Installation,
    pub ticket: Option<Ticket>,
}

/// Installation-scoped thread-to-ticket resolution.
pub struct ThreadResolver {
    installations: Arc<dyn InstallationRepository>,
    tickets: Arc<dyn TicketRepository>,
}

impl ThreadResolver {
    pub fn new(
        installations: Arc<dyn InstallationRepository>,
        tickets: Arc<dyn TicketRepository>,
    ) -> Self {
        Self {
            installations,
            tickets,
        }
    }

    /// Resolve an external (chat, thread) pair.
    ///
    /// `Ok(None)` means no installation owns the chat id: the event is
    /// not ours at all. A resolution with `ticket: None` means the chat
    /// belongs to a tenant but the thread matches no ticket; both are
    /// expected, frequent outcomes and are logged at debug only.
    pub async fn resolve(
        &self,
        platform: Platform,
        external_chat_id: &str,
        thread_ref: Option<&str>,
    ) -> Result<Option<Resolution>, DomainError> {
        let Some(installation) = self
            .installations
            .find_by_workspace(platform, external_chat_id)
            .await?
        else {
            tracing::debug!(
                platform = %platform,
                external_chat_id,
                "No installation for chat id"
            );
            return Ok(None);
        };

        let ticket = match thread_ref {
            Some(thread_ref) => {
                self.tickets
                    .find_by_thread(platform, external_chat_id, thread_ref)
                    .await?
            }
            // Top-level channel chatter has no thread context.
            None => None,
        };

        if ticket.is_none() {
            tracing::debug!(
                platform = %platform,
                external_chat_id,
                thread_ref = thread_ref.unwrap_or("-"),
                "No ticket for thread"
            );
        }

        Ok(Some(Resolution {
            installation,
            ticket,
        }))
    }
}
