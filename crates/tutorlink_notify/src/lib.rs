//! Outgoing email for Tutorlink.
//!
//! [`notifier_from_config`] picks SMTP delivery when `use_email` is set and a
//! log-only sender otherwise.

pub mod error;
pub mod log_sender;
pub mod smtp;

use std::sync::Arc;
use tracing::info;
use tutorlink_common::services::NotificationService;
use tutorlink_config::AppConfig;

pub use error::NotifyError;
pub use log_sender::LogNotifier;
pub use smtp::SmtpNotifier;

/// Shared handle to whichever sender is configured.
pub type DynNotifier = Arc<dyn NotificationService<Error = NotifyError>>;

pub fn notifier_from_config(config: &AppConfig) -> Result<DynNotifier, NotifyError> {
    if !config.use_email {
        info!("Email delivery disabled; confirmations will be logged");
        return Ok(Arc::new(LogNotifier));
    }

    let email_config = config.email.clone().ok_or_else(|| {
        NotifyError::ConfigError("use_email is set but [email] is missing".to_string())
    })?;
    info!("Email delivery via {}", email_config.smtp_host);
    Ok(Arc::new(SmtpNotifier::new(email_config)?))
}
