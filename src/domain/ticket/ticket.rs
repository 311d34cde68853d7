//! The Ticket aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, TenantId, TicketId, Timestamp, VisitorId,
};
use crate::domain::installation::Platform;

/// Ticket lifecycle status as seen by tenant agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Stable lowercase name used in storage and wire formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

/// Simplified status shown to the visitor-facing widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetStatus {
    Open,
    Closed,
}

/// The external conversation handle a ticket is mirrored into.
///
/// Exactly one of these exists per ticket, matching the tenant's active
/// installation: a Slack thread timestamp, a Discord thread id, or a
/// Telegram forum topic id, always scoped by the platform-side chat id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadLink {
    pub platform: Platform,
    /// Workspace / guild / supergroup identity.
    pub external_chat_id: String,
    /// Thread timestamp, thread id, or forum topic id.
    pub thread_ref: String,
}

impl ThreadLink {
    pub fn new(
        platform: Platform,
        external_chat_id: impl Into<String>,
        thread_ref: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            external_chat_id: external_chat_id.into(),
            thread_ref: thread_ref.into(),
        }
    }
}

/// A visitor conversation.
///
/// Created on the first visitor message; never hard-deleted. The thread
/// link is write-once: once a platform thread is attached it is never
/// reassigned. A ticket without a link is valid (the platform post may
/// have failed) and is retried or surfaced to the tenant instead of being
/// lost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    tenant_id: TenantId,
    visitor_id: VisitorId,
    subject: String,
    status: TicketStatus,
    thread_link: Option<ThreadLink>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Ticket {
    /// Opens a new ticket for a visitor's first message.
    pub fn open(tenant_id: TenantId, visitor_id: VisitorId, subject: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: TicketId::new(),
            tenant_id,
            visitor_id,
            subject: subject.into(),
            status: TicketStatus::Open,
            thread_link: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrates a ticket from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: TicketId,
        tenant_id: TenantId,
        visitor_id: VisitorId,
        subject: String,
        status: TicketStatus,
        thread_link: Option<ThreadLink>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            tenant_id,
            visitor_id,
            subject,
            status,
            thread_link,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn visitor_id(&self) -> &VisitorId {
        &self.visitor_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn status(&self) -> TicketStatus {
        self.status
    }

    pub fn thread_link(&self) -> Option<&ThreadLink> {
        self.thread_link.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Whether the platform-side thread exists. Tickets without a link
    /// render without a permalink so staff can see the post failed.
    pub fn has_thread(&self) -> bool {
        self.thread_link.is_some()
    }

    /// The simplified status exposed to the widget.
    pub fn widget_status(&self) -> WidgetStatus {
        match self.status {
            TicketStatus::Open | TicketStatus::Pending => WidgetStatus::Open,
            TicketStatus::Resolved | TicketStatus::Closed => WidgetStatus::Closed,
        }
    }

    /// Attaches the external thread handle. Write-once.
    ///
    /// # Errors
    ///
    /// Returns `ThreadAlreadyLinked` if a link is already present, even
    /// an identical one; callers must treat the first write as final.
    pub fn link_thread(&mut self, link: ThreadLink) -> Result<(), DomainError> {
        if self.thread_link.is_some() {
            return Err(DomainError::new(
                ErrorCode::ThreadAlreadyLinked,
                format!("Ticket {} already has a thread link", self.id),
            ));
        }
        self.thread_link = Some(link);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Mutates the status. Returns `true` if the status changed.
    pub fn set_status(&mut self, status: TicketStatus) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.updated_at = Timestamp::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> Ticket {
        Ticket::open(
            TenantId::from_string("acct-1"),
            VisitorId::from_string("vis-1"),
            "Checkout is broken",
        )
    }

    #[test]
    fn open_starts_open_without_thread() {
        let t = ticket();
        assert_eq!(t.status(), TicketStatus::Open);
        assert!(!t.has_thread());
        assert_eq!(t.widget_status(), WidgetStatus::Open);
    }

    #[test]
    fn link_thread_is_write_once() {
        let mut t = ticket();
        let link = ThreadLink::new(Platform::Slack, "C1", "1700000000.000100");

        t.link_thread(link.clone()).unwrap();
        assert_eq!(t.thread_link(), Some(&link));

        // Second write is refused, identical or not.
        let err = t.link_thread(link).unwrap_err();
        assert_eq!(err.code, ErrorCode::ThreadAlreadyLinked);
    }

    #[test]
    fn set_status_reports_change() {
        let mut t = ticket();
        assert!(t.set_status(TicketStatus::Pending));
        assert!(!t.set_status(TicketStatus::Pending));
        assert_eq!(t.status(), TicketStatus::Pending);
    }

    #[test]
    fn widget_status_simplifies_lifecycle() {
        let mut t = ticket();
        assert_eq!(t.widget_status(), WidgetStatus::Open);

        t.set_status(TicketStatus::Pending);
        assert_eq!(t.widget_status(), WidgetStatus::Open);

        t.set_status(TicketStatus::Resolved);
        assert_eq!(t.widget_status(), WidgetStatus::Closed);

        t.set_status(TicketStatus::Closed);
        assert_eq!(t.widget_status(), WidgetStatus::Closed);
    }

    #[test]
    fn from_parts_round_trips() {
        let original = ticket();
        let restored = Ticket::from_parts(
            original.id(),
            original.tenant_id().clone(),
            original.visitor_id().clone(),
            original.subject().to_string(),
            original.status(),
            None,
            original.created_at(),
            original.updated_at(),
        );
        assert_eq!(restored.id(), original.id());
        assert_eq!(restored.subject(), original.subject());
    }
}
