// --- File: crates/tutorlink_common/src/services.rs ---
//! Narrow interfaces to the external collaborators: payment processor,
//! email sender and identity providers.
//!
//! The traits return boxed futures so they can be used as trait objects
//! (`Arc<dyn PaymentService<Error = ...>>`) and swapped for fakes in tests.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

// --- Payments ---

/// Parameters for a new payment intent.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
    pub metadata: Vec<(String, String)>,
}

/// A payment intent as reported by the processor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntentResult {
    pub id: String,
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_received: i64,
    pub currency: String,
    pub client_secret: Option<String>,
}

pub trait PaymentService: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> BoxFuture<'_, PaymentIntentResult, Self::Error>;

    fn retrieve_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> BoxFuture<'_, PaymentIntentResult, Self::Error>;

    fn cancel_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> BoxFuture<'_, PaymentIntentResult, Self::Error>;
}

// --- Notifications ---

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub id: Option<String>,
    pub status: String,
}

pub trait NotificationService: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    fn send_email(&self, message: EmailMessage) -> BoxFuture<'_, NotificationResult, Self::Error>;
}

// --- Identity ---

/// Where to send the browser to log in, and the CSRF state to check on return.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_state: String,
}

/// Who the identity provider says the user is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityClaims {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

pub trait IdentityService: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    /// Short name used in routes, e.g. `google`.
    fn provider_name(&self) -> &str;

    fn authorization_request(&self) -> AuthorizationRequest;

    /// Exchanges an authorization code for the user's verified identity.
    fn exchange_code(&self, code: &str) -> BoxFuture<'_, IdentityClaims, Self::Error>;
}
