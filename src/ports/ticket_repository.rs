//! TicketRepository port - persistence for the Ticket aggregate.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TicketId};
use crate::domain::installation::Platform;
use crate::domain::ticket::Ticket;

/// Port for storing and retrieving tickets.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Inserts a new ticket.
    async fn save(&self, ticket: &Ticket) -> Result<(), DomainError>;

    /// Updates an existing ticket (status, thread link).
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` if the ticket does not exist.
    async fn update(&self, ticket: &Ticket) -> Result<(), DomainError>;

    /// Fetches a ticket by id.
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, DomainError>;

    /// Fetches the ticket linked to an external thread, scoped by the
    /// platform and platform-side chat id.
    ///
    /// `None` is an expected, frequent outcome for traffic in channels
    /// unrelated to any ticket.
    async fn find_by_thread(
        &self,
        platform: Platform,
        external_chat_id: &str,
        thread_ref: &str,
    ) -> Result<Option<Ticket>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn TicketRepository) {}
}
