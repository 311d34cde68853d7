//! Tenant-registered webhook endpoints.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EndpointId, TenantId, Timestamp, ValidationError};

/// Length of generated signing secrets (alphanumeric characters).
const SECRET_LEN: usize = 48;

/// A tenant-registered HTTPS endpoint receiving signed event payloads.
///
/// The signing secret is rotatable; consumers verify deliveries with the
/// current secret and must re-fetch it after rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    pub id: EndpointId,
    pub tenant_id: TenantId,
    pub url: String,
    pub secret: String,
    pub enabled: bool,
    pub created_at: Timestamp,
}

impl WebhookEndpoint {
    /// Registers a new endpoint with a freshly generated secret.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the URL is empty or not http(s).
    pub fn register(tenant_id: TenantId, url: impl Into<String>) -> Result<Self, ValidationError> {
        let url = url.into();
        if url.is_empty() {
            return Err(ValidationError::empty_field("url"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ValidationError::invalid_format("url", "must be http(s)"));
        }

        Ok(Self {
            id: EndpointId::new(),
            tenant_id,
            url,
            secret: generate_secret(),
            enabled: true,
            created_at: Timestamp::now(),
        })
    }

    /// Replaces the signing secret, returning the new value.
    pub fn rotate_secret(&mut self) -> &str {
        self.secret = generate_secret();
        &self.secret
    }

    /// Disables the endpoint; disabled endpoints receive no deliveries.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Re-enables the endpoint.
    pub fn enable(&mut self) {
        self.enabled = true;
    }
}

fn generate_secret() -> String {
    let rng = rand::thread_rng();
    let body: String = rng
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect();
    format!("whsec_{}", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> WebhookEndpoint {
        WebhookEndpoint::register(
            TenantId::from_string("acct-1"),
            "https://example.com/hooks/threadline",
        )
        .unwrap()
    }

    #[test]
    fn register_generates_prefixed_secret() {
        let ep = endpoint();
        assert!(ep.secret.starts_with("whsec_"));
        assert_eq!(ep.secret.len(), "whsec_".len() + SECRET_LEN);
        assert!(ep.enabled);
    }

    #[test]
    fn register_rejects_bad_urls() {
        let tenant = TenantId::from_string("acct-1");
        assert!(WebhookEndpoint::register(tenant.clone(), "").is_err());
        assert!(WebhookEndpoint::register(tenant, "ftp://example.com").is_err());
    }

    #[test]
    fn rotate_replaces_secret() {
        let mut ep = endpoint();
        let before = ep.secret.clone();
        let after = ep.rotate_secret().to_string();
        assert_ne!(before, after);
        assert_eq!(ep.secret, after);
    }

    #[test]
    fn disable_and_enable_toggle() {
        let mut ep = endpoint();
        ep.disable();
        assert!(!ep.enabled);
        ep.enable();
        assert!(ep.enabled);
    }
}
