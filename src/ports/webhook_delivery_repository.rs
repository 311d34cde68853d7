//! WebhookDeliveryRepository port - delivery attempt history.

use async_trait::async_trait;

use crate::domain::foundation::{DeliveryId, DomainError, EndpointId};
use crate::domain::webhook::WebhookDelivery;

/// Port for storing delivery records.
///
/// One record exists per (endpoint, triggering event); the record carries
/// attempt count and last status/error so the tenant-visible history shows
/// exactly what happened to every delivery.
#[async_trait]
pub trait WebhookDeliveryRepository: Send + Sync {
    /// Inserts a new pending delivery, before the first attempt.
    async fn insert(&self, delivery: &WebhookDelivery) -> Result<(), DomainError>;

    /// Persists the result of an attempt.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryNotFound` if the record does not exist.
    async fn update(&self, delivery: &WebhookDelivery) -> Result<(), DomainError>;

    /// Fetches a delivery by id.
    async fn find_by_id(&self, id: &DeliveryId) -> Result<Option<WebhookDelivery>, DomainError>;

    /// Lists an endpoint's deliveries, most recent first.
    async fn list_for_endpoint(
        &self,
        endpoint_id: &EndpointId,
        limit: u32,
    ) -> Result<Vec<WebhookDelivery>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn WebhookDeliveryRepository) {}
}
