//! PostgreSQL idempotency ledger.
//!
//! `check_and_mark` is a single `INSERT ... ON CONFLICT DO NOTHING`; the
//! primary key violation is the duplicate signal. One round trip, atomic
//! under concurrent delivery; a check-then-insert would race and is
//! deliberately not used.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::domain::installation::Platform;
use crate::ports::{IdempotencyLedger, LedgerDecision};

use super::db_err;

/// PostgreSQL implementation of the IdempotencyLedger port.
#[derive(Clone)]
pub struct PostgresIdempotencyLedger {
    pool: PgPool,
}

impl PostgresIdempotencyLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyLedger for PostgresIdempotencyLedger {
    async fn check_and_mark(
        &self,
        platform: Platform,
        external_chat_id: &str,
        external_event_id: &str,
    ) -> Result<LedgerDecision, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO idempotency_records (platform, external_chat_id, external_event_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(platform.as_str())
        .bind(external_chat_id)
        .bind(external_event_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("ledger insert", e))?;

        Ok(if result.rows_affected() == 1 {
            LedgerDecision::Fresh
        } else {
            LedgerDecision::Duplicate
        })
    }
}
