//! SMTP delivery through `lettre`.

use crate::error::NotifyError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, info};
use tutorlink_common::services::{BoxFuture, EmailMessage, NotificationResult, NotificationService};
use tutorlink_config::EmailConfig;

pub struct SmtpNotifier {
    config: EmailConfig,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Result<Self, NotifyError> {
        if config.smtp_host.is_empty() {
            return Err(NotifyError::ConfigError("smtp_host is empty".to_string()));
        }
        let from = parse_mailbox(&config.from)?;
        Ok(Self { config, from })
    }

    /// A new transport per message; lettre's blocking transport does not pool.
    fn build_transport(&self) -> Result<SmtpTransport, NotifyError> {
        let builder = if self.config.starttls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
        } else {
            SmtpTransport::relay(&self.config.smtp_host)
        }
        .map_err(|e| NotifyError::ConfigError(format!("SMTP relay error: {}", e)))?;

        Ok(builder
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build())
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, NotifyError> {
        let content_type = if message.is_html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };

        Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.clone())
            .header(content_type)
            .body(message.body.clone())
            .map_err(|e| NotifyError::BuildError(e.to_string()))
    }
}

pub(crate) fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
        address: address.to_string(),
        message: e.to_string(),
    })
}

/// First line of the server's reply as id, the reply code as status.
pub(crate) fn delivery_result(response: &Response) -> NotificationResult {
    let id = response.message().next().map(str::to_string);
    NotificationResult {
        id,
        status: response.code().to_string(),
    }
}

impl NotificationService for SmtpNotifier {
    type Error = NotifyError;

    fn send_email(&self, message: EmailMessage) -> BoxFuture<'_, NotificationResult, Self::Error> {
        Box::pin(async move {
            let email = self.build_message(&message)?;
            let mailer = self.build_transport()?;
            debug!("Sending '{}' to {} via {}", message.subject, message.to, self.config.smtp_host);

            let response = tokio::task::spawn_blocking(move || {
                mailer
                    .send(&email)
                    .map_err(|e| NotifyError::DeliveryError(e.to_string()))
            })
            .await
            .map_err(|e| NotifyError::DeliveryError(format!("email task failed: {}", e)))??;

            info!("Email '{}' sent to {}", message.subject, message.to);
            Ok(delivery_result(&response))
        })
    }
}
