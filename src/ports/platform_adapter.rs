//! PlatformAdapter port - one implementation per external chat platform.
//!
//! The adapter owns everything platform-specific: verifying that an
//! inbound request genuinely came from the platform, normalizing the
//! native envelope into a [`CanonicalEvent`], and the outbound "post a
//! message" / "create a thread" operations.
//!
//! Adapters are resolved once per installation from the closed
//! [`Platform`] set, never re-dispatched per call on string names.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::domain::foundation::DomainError;
use crate::domain::installation::{Installation, Platform};
use crate::domain::pipeline::{CanonicalEvent, InboundRejection};

/// A raw inbound HTTP request as seen by a platform hook route.
///
/// Headers are lower-cased by the HTTP layer; the body is the exact raw
/// bytes, which signature schemes require.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl InboundRequest {
    pub fn new(headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// An inbound event whose authenticity has been established.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedEvent {
    pub platform: Platform,
    pub payload: JsonValue,
}

/// Reference to a message posted on the platform side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalMessageRef {
    /// Platform-native message handle (ts, message id, ...).
    pub message_ref: String,
}

/// Reference to a thread/topic created on the platform side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalThreadRef {
    /// Channel / group the thread lives in.
    pub external_chat_id: String,
    /// Thread timestamp, thread id, or forum topic id.
    pub thread_ref: String,
}

/// Port implemented once per supported platform.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// The platform this adapter serves.
    fn platform(&self) -> Platform;

    /// Verifies request authenticity.
    ///
    /// Rejections are data (`InvalidSignature`, `StaleTimestamp`,
    /// `MalformedBody`), mapped to 401/400 at the HTTP edge with no side
    /// effects.
    fn verify(&self, request: &InboundRequest) -> Result<AuthenticatedEvent, InboundRejection>;

    /// Normalizes an authenticated native envelope into the canonical
    /// shape. Returns `None` for envelope types the pipeline does not
    /// consume (acks, presence changes, edits...).
    fn normalize(&self, event: &AuthenticatedEvent) -> Option<CanonicalEvent>;

    /// Posts a message to a destination channel/group, optionally inside
    /// an existing thread.
    async fn post_message(
        &self,
        installation: &Installation,
        destination: &str,
        text: &str,
        thread_ref: Option<&str>,
    ) -> Result<ExternalMessageRef, DomainError>;

    /// Creates a new thread/topic rooted at `body` in the destination
    /// channel/group.
    async fn create_thread(
        &self,
        installation: &Installation,
        destination: &str,
        title: &str,
        body: &str,
    ) -> Result<ExternalThreadRef, DomainError>;
}
