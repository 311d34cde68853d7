//! PostgreSQL implementation of MessageRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, MessageId, TicketId, Timestamp};
use crate::domain::ticket::{Message, MessageSource};
use crate::ports::MessageRepository;

use super::db_err;

/// PostgreSQL implementation of MessageRepository.
#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn insert(&self, message: &Message) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO messages (
                id, ticket_id, source, author_external_id, body,
                platform_event_id, raw, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.ticket_id.as_uuid())
        .bind(message.source.as_str())
        .bind(message.author_external_id.as_deref())
        .bind(&message.text)
        .bind(message.platform_event_id.as_deref())
        .bind(message.raw.as_ref())
        .bind(message.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("insert message", e))?;

        Ok(())
    }

    async fn list_by_ticket(&self, ticket_id: &TicketId) -> Result<Vec<Message>, DomainError> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE ticket_id = $1 ORDER BY created_at ASC",
        )
        .bind(ticket_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list messages", e))?;

        rows.into_iter().map(row_to_message).collect()
    }
}

fn row_to_message(row: PgRow) -> Result<Message, DomainError> {
    let source: String = try_get(&row, "source")?;
    let source = parse_source(&source)?;

    Ok(Message {
        id: MessageId::from_uuid(try_get(&row, "id")?),
        ticket_id: TicketId::from_uuid(try_get(&row, "ticket_id")?),
        source,
        author_external_id: try_get(&row, "author_external_id")?,
        text: try_get(&row, "body")?,
        platform_event_id: try_get(&row, "platform_event_id")?,
        raw: try_get(&row, "raw")?,
        created_at: Timestamp::from_datetime(try_get(&row, "created_at")?),
    })
}

fn parse_source(s: &str) -> Result<MessageSource, DomainError> {
    match s {
        "visitor" => Ok(MessageSource::Visitor),
        "platform-agent" => Ok(MessageSource::PlatformAgent),
        "dashboard-agent" => Ok(MessageSource::DashboardAgent),
        "system" => Ok(MessageSource::System),
        other => Err(DomainError::database(format!(
            "corrupt message source: {}",
            other
        ))),
    }
}

fn try_get<'r, T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>(
    row: &'r PgRow,
    column: &str,
) -> Result<T, DomainError> {
    row.try_get(column)
        .map_err(|e| DomainError::database(format!("column {}: {}", column, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_round_trips() {
        for source in [
            MessageSource::Visitor,
            MessageSource::PlatformAgent,
            MessageSource::DashboardAgent,
            MessageSource::System,
        ] {
            assert_eq!(parse_source(source.as_str()).unwrap(), source);
        }
    }

    #[test]
    fn parse_source_rejects_garbage() {
        assert!(parse_source("robot").is_err());
    }
}
