//! In-memory webhook endpoint and delivery stores.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DeliveryId, DomainError, EndpointId, ErrorCode, TenantId};
use crate::domain::webhook::{WebhookDelivery, WebhookEndpoint};
use crate::ports::{WebhookDeliveryRepository, WebhookEndpointRepository};

/// In-memory endpoint store.
pub struct InMemoryWebhookEndpointRepository {
    endpoints: RwLock<HashMap<EndpointId, WebhookEndpoint>>,
}

impl InMemoryWebhookEndpointRepository {
    pub fn new() -> Self {
        Self {
            endpoints: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryWebhookEndpointRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookEndpointRepository for InMemoryWebhookEndpointRepository {
    async fn save(&self, endpoint: &WebhookEndpoint) -> Result<(), DomainError> {
        self.endpoints
            .write()
            .await
            .insert(endpoint.id, endpoint.clone());
        Ok(())
    }

    async fn update(&self, endpoint: &WebhookEndpoint) -> Result<(), DomainError> {
        let mut endpoints = self.endpoints.write().await;
        if !endpoints.contains_key(&endpoint.id) {
            return Err(DomainError::new(
                ErrorCode::EndpointNotFound,
                format!("Endpoint not found: {}", endpoint.id),
            ));
        }
        endpoints.insert(endpoint.id, endpoint.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &EndpointId) -> Result<Option<WebhookEndpoint>, DomainError> {
        Ok(self.endpoints.read().await.get(id).cloned())
    }

    async fn list_enabled_for_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<WebhookEndpoint>, DomainError> {
        Ok(self
            .endpoints
            .read()
            .await
            .values()
            .filter(|e| e.tenant_id == *tenant_id && e.enabled)
            .cloned()
            .collect())
    }
}

/// In-memory delivery store.
pub struct InMemoryWebhookDeliveryRepository {
    deliveries: RwLock<HashMap<DeliveryId, WebhookDelivery>>,
}

impl InMemoryWebhookDeliveryRepository {
    pub fn new() -> Self {
        Self {
            deliveries: RwLock::new(HashMap::new()),
        }
    }

    /// All stored deliveries (test helper).
    pub async fn all(&self) -> Vec<WebhookDelivery> {
        self.deliveries.read().await.values().cloned().collect()
    }
}

impl Default for InMemoryWebhookDeliveryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookDeliveryRepository for InMemoryWebhookDeliveryRepository {
    async fn insert(&self, delivery: &WebhookDelivery) -> Result<(), DomainError> {
        self.deliveries
            .write()
            .await
            .insert(delivery.id, delivery.clone());
        Ok(())
    }

    async fn update(&self, delivery: &WebhookDelivery) -> Result<(), DomainError> {
        let mut deliveries = self.deliveries.write().await;
        if !deliveries.contains_key(&delivery.id) {
            return Err(DomainError::new(
                ErrorCode::DeliveryNotFound,
                format!("Delivery not found: {}", delivery.id),
            ));
        }
        deliveries.insert(delivery.id, delivery.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &DeliveryId) -> Result<Option<WebhookDelivery>, DomainError> {
        Ok(self.deliveries.read().await.get(id).cloned())
    }

    async fn list_for_endpoint(
        &self,
        endpoint_id: &EndpointId,
        limit: u32,
    ) -> Result<Vec<WebhookDelivery>, DomainError> {
        let mut matching: Vec<_> = self
            .deliveries
            .read()
            .await
            .values()
            .filter(|d| d.endpoint_id == *endpoint_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}
