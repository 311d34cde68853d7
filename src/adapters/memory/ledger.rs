//! In-memory idempotency ledger.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;

use crate::domain::foundation::DomainError;
use crate::domain::installation::Platform;
use crate::ports::{IdempotencyLedger, LedgerDecision};

/// Mutex-guarded set; `insert` is the single atomic check-and-mark.
pub struct InMemoryIdempotencyLedger {
    seen: Mutex<HashSet<(Platform, String, String)>>,
}

impl InMemoryIdempotencyLedger {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Number of recorded events (test helper).
    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }

    /// Whether the ledger is empty (test helper).
    pub async fn is_empty(&self) -> bool {
        self.seen.lock().await.is_empty()
    }
}

impl Default for InMemoryIdempotencyLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdempotencyLedger for InMemoryIdempotencyLedger {
    async fn check_and_mark(
        &self,
        platform: Platform,
        external_chat_id: &str,
        external_event_id: &str,
    ) -> Result<LedgerDecision, DomainError> {
        let key = (
            platform,
            external_chat_id.to_string(),
            external_event_id.to_string(),
        );

        let fresh = self.seen.lock().await.insert(key);
        Ok(if fresh {
            LedgerDecision::Fresh
        } else {
            LedgerDecision::Duplicate
        })
    }
}
