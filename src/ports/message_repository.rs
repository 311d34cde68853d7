//! MessageRepository port - persistence for canonical messages.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TicketId};
use crate::domain::ticket::Message;

/// Port for storing and listing canonical messages.
///
/// Messages are immutable: there is no update operation.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Inserts a new message.
    async fn insert(&self, message: &Message) -> Result<(), DomainError>;

    /// Lists a ticket's messages in creation order.
    async fn list_by_ticket(&self, ticket_id: &TicketId) -> Result<Vec<Message>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn MessageRepository) {}
}
