//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyField,
    InvalidFormat,

    // Not found errors
    TicketNotFound,
    InstallationNotFound,
    EndpointNotFound,
    DeliveryNotFound,

    // State errors
    ThreadAlreadyLinked,
    InvalidStateTransition,
    DeliveryAlreadyTerminal,

    // Inbound verification errors
    AuthenticationRejected,

    // Upstream platform errors
    PlatformApiError,

    // Infrastructure errors
    DatabaseError,
    QueueError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::TicketNotFound => "TICKET_NOT_FOUND",
            ErrorCode::InstallationNotFound => "INSTALLATION_NOT_FOUND",
            ErrorCode::EndpointNotFound => "ENDPOINT_NOT_FOUND",
            ErrorCode::DeliveryNotFound => "DELIVERY_NOT_FOUND",
            ErrorCode::ThreadAlreadyLinked => "THREAD_ALREADY_LINKED",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::DeliveryAlreadyTerminal => "DELIVERY_ALREADY_TERMINAL",
            ErrorCode::AuthenticationRejected => "AUTHENTICATION_REJECTED",
            ErrorCode::PlatformApiError => "PLATFORM_API_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::QueueError => "QUEUE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field.into())
    }

    /// Creates a datastore failure. This is the only error class the job
    /// runtime retries.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Creates an upstream platform API failure.
    pub fn platform_api(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PlatformApiError, message)
    }

    /// Whether this error represents datastore unavailability and should
    /// be retried by the job runtime.
    pub fn is_storage(&self) -> bool {
        self.code == ErrorCode::DatabaseError
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("url");
        assert_eq!(format!("{}", err), "Field 'url' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("thread_ref", "expected numeric id");
        assert_eq!(
            format!("{}", err),
            "Field 'thread_ref' has invalid format: expected numeric id"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::TicketNotFound, "Ticket not found");
        assert_eq!(format!("{}", err), "[TICKET_NOT_FOUND] Ticket not found");
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::validation("url", "must be https")
            .with_detail("value", "http://example.com");

        assert_eq!(err.details.get("field"), Some(&"url".to_string()));
        assert_eq!(err.details.get("value"), Some(&"http://example.com".to_string()));
    }

    #[test]
    fn only_database_errors_are_storage() {
        assert!(DomainError::database("connection refused").is_storage());
        assert!(!DomainError::platform_api("slack 500").is_storage());
        assert!(!DomainError::new(ErrorCode::InternalError, "boom").is_storage());
    }
}
