//! WebhookEndpointRepository port - tenant-registered webhook endpoints.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EndpointId, TenantId};
use crate::domain::webhook::WebhookEndpoint;

/// Port for storing webhook endpoints.
#[async_trait]
pub trait WebhookEndpointRepository: Send + Sync {
    /// Inserts a new endpoint.
    async fn save(&self, endpoint: &WebhookEndpoint) -> Result<(), DomainError>;

    /// Updates an endpoint (enabled flag, rotated secret).
    ///
    /// # Errors
    ///
    /// Returns `EndpointNotFound` if the endpoint does not exist.
    async fn update(&self, endpoint: &WebhookEndpoint) -> Result<(), DomainError>;

    /// Fetches an endpoint by id.
    async fn find_by_id(&self, id: &EndpointId) -> Result<Option<WebhookEndpoint>, DomainError>;

    /// Lists the tenant's enabled endpoints; disabled endpoints receive
    /// no deliveries.
    async fn list_enabled_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<WebhookEndpoint>, DomainError>;
}
