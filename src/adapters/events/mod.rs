//! Event infrastructure adapters: buses and the viewer fan-out feed.

mod fanout_bridge;
mod in_memory;
mod local_bus;
mod ticket_feed;

pub use fanout_bridge::{TicketFeedBridge, FEED_EVENT_TYPES};
pub use in_memory::InMemoryEventBus;
pub use local_bus::LocalEventBus;
pub use ticket_feed::{TicketFeed, TicketMessagePayload, TicketSubscription};
