//! Outbound webhook delivery plumbing: payload signing and HTTP sending.

mod sender;
mod signer;

pub use sender::{AttemptOutcome, WebhookSender};
pub use signer::{sign_payload, verify_payload, SignatureError};
