//! PostgreSQL implementation of TicketRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    DomainError, ErrorCode, TenantId, TicketId, Timestamp, VisitorId,
};
use crate::domain::installation::Platform;
use crate::domain::ticket::{ThreadLink, Ticket, TicketStatus};
use crate::ports::TicketRepository;

use super::db_err;

/// PostgreSQL implementation of TicketRepository.
#[derive(Clone)]
pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn save(&self, ticket: &Ticket) -> Result<(), DomainError> {
        let link = ticket.thread_link();
        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, tenant_id, visitor_id, subject, status,
                thread_platform, thread_chat_id, thread_ref,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(ticket.id().as_uuid())
        .bind(ticket.tenant_id().as_str())
        .bind(ticket.visitor_id().as_str())
        .bind(ticket.subject())
        .bind(ticket.status().as_str())
        .bind(link.map(|l| l.platform.as_str()))
        .bind(link.map(|l| l.external_chat_id.as_str()))
        .bind(link.map(|l| l.thread_ref.as_str()))
        .bind(ticket.created_at().as_datetime())
        .bind(ticket.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("insert ticket", e))?;

        Ok(())
    }

    async fn update(&self, ticket: &Ticket) -> Result<(), DomainError> {
        let link = ticket.thread_link();
        let result = sqlx::query(
            r#"
            UPDATE tickets SET
                status = $2,
                thread_platform = $3,
                thread_chat_id = $4,
                thread_ref = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(ticket.id().as_uuid())
        .bind(ticket.status().as_str())
        .bind(link.map(|l| l.platform.as_str()))
        .bind(link.map(|l| l.external_chat_id.as_str()))
        .bind(link.map(|l| l.thread_ref.as_str()))
        .bind(ticket.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("update ticket", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::TicketNotFound,
                format!("Ticket not found: {}", ticket.id()),
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, DomainError> {
        let row = sqlx::query("SELECT * FROM tickets WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("fetch ticket", e))?;

        row.map(row_to_ticket).transpose()
    }

    async fn find_by_thread(
        &self,
        platform: Platform,
        external_chat_id: &str,
        thread_ref: &str,
    ) -> Result<Option<Ticket>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM tickets
            WHERE thread_platform = $1 AND thread_chat_id = $2 AND thread_ref = $3
            "#,
        )
        .bind(platform.as_str())
        .bind(external_chat_id)
        .bind(thread_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("fetch ticket by thread", e))?;

        row.map(row_to_ticket).transpose()
    }
}

fn row_to_ticket(row: PgRow) -> Result<Ticket, DomainError> {
    let status: String = get(&row, "status")?;
    let status = parse_status(&status)?;

    let thread_platform: Option<String> = get(&row, "thread_platform")?;
    let thread_link = match thread_platform {
        Some(platform) => {
            let platform: Platform = platform.parse().map_err(|_| {
                DomainError::database(format!("corrupt thread_platform: {}", platform))
            })?;
            let external_chat_id: Option<String> = get(&row, "thread_chat_id")?;
            let thread_ref: Option<String> = get(&row, "thread_ref")?;
            match (external_chat_id, thread_ref) {
                (Some(chat), Some(thread)) => Some(ThreadLink::new(platform, chat, thread)),
                _ => None,
            }
        }
        None => None,
    };

    Ok(Ticket::from_parts(
        TicketId::from_uuid(get(&row, "id")?),
        TenantId::from_string(get::<String>(&row, "tenant_id")?),
        VisitorId::from_string(get::<String>(&row, "visitor_id")?),
        get(&row, "subject")?,
        status,
        thread_link,
        Timestamp::from_datetime(get(&row, "created_at")?),
        Timestamp::from_datetime(get(&row, "updated_at")?),
    ))
}

fn parse_status(s: &str) -> Result<TicketStatus, DomainError> {
    match s {
        "open" => Ok(TicketStatus::Open),
        "pending" => Ok(TicketStatus::Pending),
        "resolved" => Ok(TicketStatus::Resolved),
        "closed" => Ok(TicketStatus::Closed),
        other => Err(DomainError::database(format!(
            "corrupt ticket status: {}",
            other
        ))),
    }
}

fn get<'r, T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>(
    row: &'r PgRow,
    column: &str,
) -> Result<T, DomainError> {
    row.try_get(column)
        .map_err(|e| DomainError::database(format!("column {}: {}", column, e)))
}
