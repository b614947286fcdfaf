// --- File: crates/tutorlink_stripe/src/handlers.rs ---
use crate::error::StripeError;
use crate::logic::{
    cancel_payment_intent, create_payment_intent, process_stripe_webhook, reconcile_payment,
    verify_stripe_signature, CancelPaymentResponse, HandlePaymentRequest, HandlePaymentResponse,
    StripeEvent,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use tutorlink_auth::CurrentUser;
use tutorlink_common::services::PaymentService;
use tutorlink_common::{ApiResult, TutorlinkError};
use tutorlink_config::{AppConfig, StripeConfig};
use tutorlink_db::Store;
use tutorlink_notify::DynNotifier;

pub type DynPaymentService = Arc<dyn PaymentService<Error = StripeError>>;

pub struct PaymentState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    /// `None` when Stripe is not configured.
    pub payments: Option<DynPaymentService>,
    pub notifier: DynNotifier,
}

impl PaymentState {
    /// Stripe settings and client, or `Disabled` when payments are switched off.
    fn stripe(&self) -> Result<(&StripeConfig, &DynPaymentService), StripeError> {
        if !self.config.use_stripe {
            return Err(StripeError::Disabled);
        }
        match (self.config.stripe.as_ref(), self.payments.as_ref()) {
            (Some(config), Some(payments)) => Ok((config, payments)),
            _ => Err(StripeError::ConfigError),
        }
    }
}

#[axum::debug_handler]
pub async fn create_payment_intent_handler(
    State(state): State<Arc<PaymentState>>,
    user: CurrentUser,
) -> Response {
    let (config, payments) = match state.stripe() {
        Ok(stripe) => stripe,
        Err(e) => return TutorlinkError::from(e).into_response(),
    };

    match create_payment_intent(&state.store, payments.as_ref(), config, &user.email).await {
        Ok(response) => Json(response).into_response(),
        // Processor failures keep the flat `{"error": ...}` shape the checkout page expects.
        Err(e) if e.is_processor_error() => {
            error!("Creating intent for {} failed: {}", user.email, e);
            (StatusCode::FORBIDDEN, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Err(e) => TutorlinkError::from(e).into_response(),
    }
}

#[axum::debug_handler]
pub async fn handle_payment_handler(
    State(state): State<Arc<PaymentState>>,
    user: CurrentUser,
    Form(request): Form<HandlePaymentRequest>,
) -> ApiResult<HandlePaymentResponse> {
    let (config, payments) = state.stripe()?;
    let intent_id = request
        .intent_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            info!("No intentId passed by {}", user.email);
            StripeError::MissingIntentId
        })?;

    let result = reconcile_payment(
        &state.store,
        payments.as_ref(),
        state.notifier.as_ref(),
        config,
        &user.email,
        intent_id.trim(),
    )
    .await?;
    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn cancel_payment_intent_handler(
    State(state): State<Arc<PaymentState>>,
    user: CurrentUser,
) -> ApiResult<CancelPaymentResponse> {
    let (_, payments) = state.stripe()?;
    let result = cancel_payment_intent(&state.store, payments.as_ref(), &user.email).await?;
    Ok(Json(result))
}

// Stripe's server-to-server notifications. Configure this URL in the Stripe Dashboard.
#[axum::debug_handler]
pub async fn stripe_webhook_handler(
    State(state): State<Arc<PaymentState>>,
    headers: HeaderMap,
    body: String, // Raw body for signature verification
) -> Result<StatusCode, TutorlinkError> {
    let (config, payments) = state.stripe()?;

    match config.webhook_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => {
            let sig_header = headers.get("Stripe-Signature").and_then(|h| h.to_str().ok());
            let now = chrono::Utc::now().timestamp();
            verify_stripe_signature(body.as_bytes(), sig_header, secret, now)?;
        }
        None => warn!("stripe.webhook_secret is not set; accepting unsigned webhook"),
    }

    let event: StripeEvent = serde_json::from_str(&body).map_err(|e| {
        warn!("Failed to deserialize Stripe webhook event: {}", e);
        TutorlinkError::ValidationError("Invalid payload format".to_string())
    })?;

    process_stripe_webhook(
        event,
        &state.store,
        payments.as_ref(),
        state.notifier.as_ref(),
        config,
    )
    .await?;
    Ok(StatusCode::OK)
}
