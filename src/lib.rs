//! Threadline - Support chat bridged to your team chat
//!
//! Multi-tenant platform connecting website-embedded chat widgets with a
//! tenant's Slack workspace, Discord guild, or Telegram group. The core is
//! the event pipeline: verified inbound platform events are deduplicated,
//! correlated to tickets, mirrored into canonical messages, fanned out to
//! live dashboard viewers, and delivered to tenant webhook endpoints.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
