//! PostgreSQL implementation of WebhookDeliveryRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DeliveryId, DomainError, EndpointId, ErrorCode, Timestamp};
use crate::domain::webhook::{DeliveryStatus, WebhookDelivery};
use crate::ports::WebhookDeliveryRepository;

use super::db_err;

/// PostgreSQL implementation of WebhookDeliveryRepository.
#[derive(Clone)]
pub struct PostgresWebhookDeliveryRepository {
    pool: PgPool,
}

impl PostgresWebhookDeliveryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookDeliveryRepository for PostgresWebhookDeliveryRepository {
    async fn insert(&self, delivery: &WebhookDelivery) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_deliveries (
                id, endpoint_id, event_type, idempotency_key, payload,
                status, attempt_count, last_status, last_error,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(delivery.id.as_uuid())
        .bind(delivery.endpoint_id.as_uuid())
        .bind(&delivery.event_type)
        .bind(&delivery.idempotency_key)
        .bind(&delivery.payload)
        .bind(delivery.status.as_str())
        .bind(delivery.attempt_count as i32)
        .bind(delivery.last_status.map(|s| s as i32))
        .bind(delivery.last_error.as_deref())
        .bind(delivery.created_at.as_datetime())
        .bind(delivery.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("insert delivery", e))?;

        Ok(())
    }

    async fn update(&self, delivery: &WebhookDelivery) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_deliveries SET
                status = $2,
                attempt_count = $3,
                last_status = $4,
                last_error = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(delivery.id.as_uuid())
        .bind(delivery.status.as_str())
        .bind(delivery.attempt_count as i32)
        .bind(delivery.last_status.map(|s| s as i32))
        .bind(delivery.last_error.as_deref())
        .bind(delivery.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("update delivery", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::DeliveryNotFound,
                format!("Delivery not found: {}", delivery.id),
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &DeliveryId) -> Result<Option<WebhookDelivery>, DomainError> {
        let row = sqlx::query("SELECT * FROM webhook_deliveries WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("fetch delivery", e))?;

        row.map(row_to_delivery).transpose()
    }

    async fn list_for_endpoint(
        &self,
        endpoint_id: &EndpointId,
        limit: u32,
    ) -> Result<Vec<WebhookDelivery>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM webhook_deliveries
            WHERE endpoint_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(endpoint_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list deliveries", e))?;

        rows.into_iter().map(row_to_delivery).collect()
    }
}

fn row_to_delivery(row: PgRow) -> Result<WebhookDelivery, DomainError> {
    let status: String = try_get(&row, "status")?;
    let status = parse_status(&status)?;
    let attempt_count: i32 = try_get(&row, "attempt_count")?;
    let last_status: Option<i32> = try_get(&row, "last_status")?;

    Ok(WebhookDelivery {
        id: DeliveryId::from_uuid(try_get(&row, "id")?),
        endpoint_id: EndpointId::from_uuid(try_get(&row, "endpoint_id")?),
        event_type: try_get(&row, "event_type")?,
        idempotency_key: try_get(&row, "idempotency_key")?,
        payload: try_get(&row, "payload")?,
        status,
        attempt_count: attempt_count.max(0) as u32,
        last_status: last_status.map(|s| s.clamp(0, u16::MAX as i32) as u16),
        last_error: try_get(&row, "last_error")?,
        created_at: Timestamp::from_datetime(try_get(&row, "created_at")?),
        updated_at: Timestamp::from_datetime(try_get(&row, "updated_at")?),
    })
}

fn parse_status(s: &str) -> Result<DeliveryStatus, DomainError> {
    match s {
        "pending" => Ok(DeliveryStatus::Pending),
        "success" => Ok(DeliveryStatus::Success),
        "failed" => Ok(DeliveryStatus::Failed),
        other => Err(DomainError::database(format!(
            "corrupt delivery status: {}",
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
    fn parse_status_round_trips() {
        for status in [
            DeliveryStatus::Pending,
            DeliveryStatus::Success,
            DeliveryStatus::Failed,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn parse_status_rejects_garbage() {
        assert!(parse_status("retrying").is_err());
    }
}
