//! Stand-in sender used when `use_email` is off: the message is only logged.

use crate::error::NotifyError;
use tracing::info;
use tutorlink_common::services::{BoxFuture, EmailMessage, NotificationResult, NotificationService};
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl NotificationService for LogNotifier {
    type Error = NotifyError;

    fn send_email(&self, message: EmailMessage) -> BoxFuture<'_, NotificationResult, Self::Error> {
        Box::pin(async move {
            info!(
                to = %message.to,
                subject = %message.subject,
                "Email delivery disabled; message body:\n{}",
                message.body
            );
            Ok(NotificationResult {
                id: Some(Uuid::new_v4().to_string()),
                status: "logged".to_string(),
            })
        })
    }
}
