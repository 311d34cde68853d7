//! Ticket aggregate: visitor conversations and their canonical messages.

mod events;
mod message;
mod ticket;

pub use events::{MessageCreated, TicketCreated, TicketUpdated};
pub use message::{Message, MessageSource};
pub use ticket::{ThreadLink, Ticket, TicketStatus, WidgetStatus};
