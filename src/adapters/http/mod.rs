//! HTTP edge: platform hook routes, live viewer routes, health.

mod hooks;
mod router;

pub use hooks::{discord_hook, slack_hook, HookState};
pub use router::build_router;
