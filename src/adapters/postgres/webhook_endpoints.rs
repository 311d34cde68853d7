//! PostgreSQL implementation of WebhookEndpointRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, EndpointId, ErrorCode, TenantId, Timestamp};
use crate::domain::webhook::WebhookEndpoint;
use crate::ports::WebhookEndpointRepository;

use super::db_err;

/// PostgreSQL implementation of WebhookEndpointRepository.
#[derive(Clone)]
pub struct PostgresWebhookEndpointRepository {
    pool: PgPool,
}

impl PostgresWebhookEndpointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookEndpointRepository for PostgresWebhookEndpointRepository {
    async fn save(&self, endpoint: &WebhookEndpoint) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_endpoints (id, tenant_id, url, secret, enabled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(endpoint.id.as_uuid())
        .bind(endpoint.tenant_id.as_str())
        .bind(&endpoint.url)
        .bind(&endpoint.secret)
        .bind(endpoint.enabled)
        .bind(endpoint.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("insert endpoint", e))?;

        Ok(())
    }

    async fn update(&self, endpoint: &WebhookEndpoint) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_endpoints SET url = $2, secret = $3, enabled = $4
            WHERE id = $1
            "#,
        )
        .bind(endpoint.id.as_uuid())
        .bind(&endpoint.url)
        .bind(&endpoint.secret)
        .bind(endpoint.enabled)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("update endpoint", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::EndpointNotFound,
                format!("Endpoint not found: {}", endpoint.id),
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &EndpointId) -> Result<Option<WebhookEndpoint>, DomainError> {
        let row = sqlx::query("SELECT * FROM webhook_endpoints WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("fetch endpoint", e))?;

        row.map(row_to_endpoint).transpose()
    }

    async fn list_enabled_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<WebhookEndpoint>, DomainError> {
        let rows = sqlx::query(
            "SELECT * FROM webhook_endpoints WHERE tenant_id = $1 AND enabled ORDER BY created_at",
        )
        .bind(tenant_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list endpoints", e))?;

        rows.into_iter().map(row_to_endpoint).collect()
    }
}

fn row_to_endpoint(row: PgRow) -> Result<WebhookEndpoint, DomainError> {
    Ok(WebhookEndpoint {
        id: EndpointId::from_uuid(try_get(&row, "id")?),
        tenant_id: TenantId::from_string(try_get::<String>(&row, "tenant_id")?),
        url: try_get(&row, "url")?,
        secret: try_get(&row, "secret")?,
        enabled: try_get(&row, "enabled")?,
        created_at: Timestamp::from_datetime(try_get(&row, "created_at")?),
    })
}

fn try_get<'r, T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>(
    row: &'r PgRow,
    column: &str,
) -> Result<T, DomainError> {
    row.try_get(column)
        .map_err(|e| DomainError::database(format!("column {}: {}", column, e)))
}
