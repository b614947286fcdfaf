// --- File: crates/services/tutorlink_backend/src/service_factory.rs ---
//! External collaborators of the service.
//!
//! Login providers, the payment processor and the mail sender are built once
//! from the configuration and shared by every router.
use crate::error::StartupError;
use tracing::info;
use tutorlink_auth::{providers_from_config, DynIdentityService};
use tutorlink_config::AppConfig;
use tutorlink_notify::{notifier_from_config, DynNotifier, LogNotifier};
use tutorlink_stripe::{payments_from_config, DynPaymentService};
use std::sync::Arc;

#[derive(Clone)]
pub struct TutorlinkServiceFactory {
    identity_providers: Vec<DynIdentityService>,
    payment_service: Option<DynPaymentService>,
    notification_service: DynNotifier,
}

impl TutorlinkServiceFactory {
    /// Builds every service the configuration enables.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let identity_providers = providers_from_config(config)?;
        if identity_providers.is_empty() {
            info!("No login provider enabled; /login will answer with an error");
        }

        let payment_service = payments_from_config(config)?;
        if payment_service.is_some() {
            info!("Stripe payments enabled");
        }

        Ok(Self {
            identity_providers,
            payment_service,
            notification_service: notifier_from_config(config)?,
        })
    }

    /// No login providers, no payments and a log-only mail sender.
    pub fn empty() -> Self {
        Self {
            identity_providers: Vec::new(),
            payment_service: None,
            notification_service: Arc::new(LogNotifier),
        }
    }

    pub fn with_identity_provider(mut self, provider: DynIdentityService) -> Self {
        self.identity_providers.push(provider);
        self
    }

    pub fn with_payment_service(mut self, payments: DynPaymentService) -> Self {
        self.payment_service = Some(payments);
        self
    }

    pub fn with_notification_service(mut self, notifier: DynNotifier) -> Self {
        self.notification_service = notifier;
        self
    }

    pub fn identity_providers(&self) -> Vec<DynIdentityService> {
        self.identity_providers.clone()
    }

    pub fn payment_service(&self) -> Option<DynPaymentService> {
        self.payment_service.clone()
    }

    pub fn notification_service(&self) -> DynNotifier {
        self.notification_service.clone()
    }
}
