// --- File: crates/tutorlink_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type shared by all Tutorlink crates.
///
/// Crate-specific errors (`DbError`, `AuthError`, `BookingError`, `StripeError`, ...)
/// implement `From<...> for TutorlinkError` so handlers can return a single type.
#[derive(Error, Debug)]
pub enum TutorlinkError {
    /// Error occurred during an outbound HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Caller is not logged in or the credential is invalid
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Caller is logged in but may not perform the operation
    #[error("Forbidden: {0}")]
    ForbiddenError(String),

    /// Request failed validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The payment received does not cover the amount due
    #[error("Payment required: {0}")]
    PaymentRequiredError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Resource state does not allow the operation
    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Feature is disabled by configuration
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Maps an error to the HTTP status code it should be reported with.
pub trait HttpStatusCode {
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for TutorlinkError {
    fn status_code(&self) -> u16 {
        match self {
            TutorlinkError::HttpError(_) => 502,
            TutorlinkError::ParseError(_) => 400,
            TutorlinkError::ConfigError(_) => 500,
            TutorlinkError::AuthError(_) => 401,
            TutorlinkError::ForbiddenError(_) => 403,
            TutorlinkError::ValidationError(_) => 400,
            TutorlinkError::PaymentRequiredError(_) => 402,
            TutorlinkError::DatabaseError(_) => 500,
            TutorlinkError::ExternalServiceError { .. } => 502,
            TutorlinkError::ConflictError(_) => 409,
            TutorlinkError::NotFoundError(_) => 404,
            TutorlinkError::ServiceUnavailable(_) => 503,
            TutorlinkError::InternalError(_) => 500,
        }
    }
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> TutorlinkError {
    TutorlinkError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}
