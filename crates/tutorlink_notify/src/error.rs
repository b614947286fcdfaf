use thiserror::Error;
use tutorlink_common::{external_service_error, HttpStatusCode, TutorlinkError};

#[derive(Error, Debug)]
pub enum NotifyError {
    /// Missing or incomplete `[email]` configuration
    #[error("Email configuration missing or incomplete: {0}")]
    ConfigError(String),

    #[error("Invalid email address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    #[error("Failed to build email: {0}")]
    BuildError(String),

    /// The SMTP relay refused or dropped the message
    #[error("SMTP delivery failed: {0}")]
    DeliveryError(String),
}

impl HttpStatusCode for NotifyError {
    fn status_code(&self) -> u16 {
        match self {
            NotifyError::ConfigError(_) => 500,
            NotifyError::InvalidAddress { .. } => 400,
            NotifyError::BuildError(_) => 500,
            NotifyError::DeliveryError(_) => 502,
        }
    }
}

impl From<NotifyError> for TutorlinkError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::ConfigError(msg) => TutorlinkError::ConfigError(msg),
            NotifyError::InvalidAddress { address, message } => {
                TutorlinkError::ValidationError(format!("{}: {}", address, message))
            }
            NotifyError::BuildError(msg) => TutorlinkError::InternalError(msg),
            NotifyError::DeliveryError(msg) => external_service_error("SMTP", msg),
        }
    }
}
