//! PostgreSQL implementation of InstallationRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    ChannelConfigId, DomainError, ErrorCode, InstallationId, TenantId, Timestamp,
};
use crate::domain::installation::{ChannelConfig, Installation, Platform};
use crate::ports::InstallationRepository;

use super::db_err;

/// PostgreSQL implementation of InstallationRepository.
#[derive(Clone)]
pub struct PostgresInstallationRepository {
    pool: PgPool,
}

impl PostgresInstallationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstallationRepository for PostgresInstallationRepository {
    async fn save(&self, installation: &Installation) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO installations (
                id, tenant_id, platform, external_workspace_id,
                bot_token, bot_user_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(installation.id.as_uuid())
        .bind(installation.tenant_id.as_str())
        .bind(installation.platform.as_str())
        .bind(&installation.external_workspace_id)
        .bind(&installation.bot_token)
        .bind(&installation.bot_user_id)
        .bind(installation.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("insert installation", e))?;

        Ok(())
    }

    async fn delete(&self, id: &InstallationId) -> Result<(), DomainError> {
        // Channel configs cascade via the foreign key.
        let result = sqlx::query("DELETE FROM installations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("delete installation", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::InstallationNotFound,
                format!("Installation not found: {}", id),
            ));
        }

        Ok(())
    }

    async fn find_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<Installation>, DomainError> {
        let row = sqlx::query("SELECT * FROM installations WHERE tenant_id = $1")
            .bind(tenant_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("fetch installation by tenant", e))?;

        row.map(row_to_installation).transpose()
    }

    async fn find_by_workspace(
        &self,
        platform: Platform,
        external_workspace_id: &str,
    ) -> Result<Option<Installation>, DomainError> {
        let row = sqlx::query(
            "SELECT * FROM installations WHERE platform = $1 AND external_workspace_id = $2",
        )
        .bind(platform.as_str())
        .bind(external_workspace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("fetch installation by workspace", e))?;

        row.map(row_to_installation).transpose()
    }

    async fn save_channel_config(&self, config: &ChannelConfig) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO channel_configs (
                id, installation_id, external_channel_id, name, is_default
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(config.id.as_uuid())
        .bind(config.installation_id.as_uuid())
        .bind(&config.external_channel_id)
        .bind(&config.name)
        .bind(config.is_default)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("insert channel config", e))?;

        Ok(())
    }

    async fn default_channel(
        &self,
        installation_id: &InstallationId,
    ) -> Result<Option<ChannelConfig>, DomainError> {
        let row = sqlx::query(
            "SELECT * FROM channel_configs WHERE installation_id = $1 AND is_default",
        )
        .bind(installation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("fetch default channel", e))?;

        row.map(row_to_channel_config).transpose()
    }
}

fn row_to_installation(row: PgRow) -> Result<Installation, DomainError> {
    let platform: String = try_get(&row, "platform")?;
    let platform: Platform = platform
        .parse()
        .map_err(|_| DomainError::database(format!("corrupt platform: {}", platform)))?;

    Ok(Installation {
        id: InstallationId::from_uuid(try_get(&row, "id")?),
        tenant_id: TenantId::from_string(try_get::<String>(&row, "tenant_id")?),
        platform,
        external_workspace_id: try_get(&row, "external_workspace_id")?,
        bot_token: try_get(&row, "bot_token")?,
        bot_user_id: try_get(&row, "bot_user_id")?,
        created_at: Timestamp::from_datetime(try_get(&row, "created_at")?),
    })
}

fn row_to_channel_config(row: PgRow) -> Result<ChannelConfig, DomainError> {
    Ok(ChannelConfig {
        id: ChannelConfigId::from_uuid(try_get(&row, "id")?),
        installation_id: InstallationId::from_uuid(try_get(&row, "installation_id")?),
        external_channel_id: try_get(&row, "external_channel_id")?,
        name: try_get(&row, "name")?,
        is_default: try_get(&row, "is_default")?,
    })
}

fn try_get<'r, T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>(
    row: &'r PgRow,
    column: &str,
) -> Result<T, DomainError> {
    row.try_get(column)
        .map_err(|e| DomainError::database(format!("column {}: {}", column, e)))
}
