// --- File: crates/tutorlink_stripe/src/logic.rs ---
use chrono::DateTime;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, error, info, warn};

use crate::error::StripeError;
use crate::pricing::amount_due;
use tutorlink_common::services::{
    EmailMessage, NotificationService, PaymentIntentRequest, PaymentService,
};
use tutorlink_config::StripeConfig;
use tutorlink_db::{CartRepository, Checkout, DbError, Store, TimeSlotRepository};
use tutorlink_notify::NotifyError;

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

pub type Payments = dyn PaymentService<Error = StripeError>;
pub type Notifier = dyn NotificationService<Error = NotifyError>;

/// Oldest webhook timestamp still accepted, in seconds.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

// --- Data Structures ---

/// What the browser needs to confirm the card payment with Stripe.js.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    #[cfg_attr(feature = "openapi", schema(example = "pk_test_..."))]
    pub publishable_key: String,
    #[cfg_attr(feature = "openapi", schema(example = "pi_3Nx..._secret_..."))]
    pub client_secret: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "pi_3Nx..."))]
    pub intent_id: String,
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema, IntoParams))]
pub struct HandlePaymentRequest {
    #[serde(rename = "intentId")]
    #[cfg_attr(feature = "openapi", schema(example = "pi_3Nx..."))]
    pub intent_id: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct HandlePaymentResponse {
    #[cfg_attr(feature = "openapi", schema(example = "claimed"))]
    pub status: String,
    pub claimed: Vec<i64>,
    /// Slots another student claimed before this payment was reconciled.
    pub unavailable: Vec<i64>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CancelPaymentResponse {
    #[cfg_attr(feature = "openapi", schema(example = "canceled"))]
    pub status: String,
    pub intent_id: String,
}

/// Represents the `data` field within a Stripe Event.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeEventData {
    /// Shape depends on the event type; for `payment_intent.*` it is the intent.
    pub object: serde_json::Value,
}

/// Represents the outer Stripe Event object.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeEvent {
    pub id: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    #[serde(rename = "type")]
    pub event_type: String, // e.g., "payment_intent.succeeded"
    pub data: StripeEventData,
}

impl StripeEvent {
    fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }
}

// --- Checkout Logic ---

/// Prices the caller's cart and opens a PaymentIntent for it. The intent id
/// is recorded on the cart, which freezes it until the payment resolves.
pub async fn create_payment_intent(
    store: &Store,
    payments: &Payments,
    config: &StripeConfig,
    email: &str,
) -> Result<CreatePaymentIntentResponse, StripeError> {
    let cart = store.carts.get_cart(email).await?;
    if let Some(intent_id) = cart.intent_id {
        info!("Intent {} already created. Aborting.", intent_id);
        return Err(StripeError::IntentPending(intent_id));
    }
    if cart.is_empty() {
        info!("Invalid number of sessions for {}: cart is empty", email);
        return Err(StripeError::EmptyCart);
    }

    let amount = amount_due(config, cart.len());
    let intent = payments
        .create_payment_intent(PaymentIntentRequest {
            amount,
            currency: config.currency.clone(),
            description: Some(format!("Tutorlink: {} tutoring session(s)", cart.len())),
            metadata: vec![("student_email".to_string(), email.to_string())],
        })
        .await?;

    match store.carts.set_intent(email, &intent.id).await {
        Ok(()) => {}
        Err(DbError::Conflict(_)) => {
            // A concurrent request recorded its intent first; ours is orphaned.
            warn!("Lost race recording {} for {}; cancelling it", intent.id, email);
            if let Err(e) = payments.cancel_payment_intent(&intent.id).await {
                error!("Failed to cancel orphaned intent {}: {}", intent.id, e);
            }
            let pending = store
                .carts
                .get_cart(email)
                .await?
                .intent_id
                .unwrap_or_default();
            return Err(StripeError::IntentPending(pending));
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        "Intent {} for {} ({} session(s), {} {})",
        intent.id,
        email,
        cart.len(),
        amount,
        config.currency
    );
    Ok(CreatePaymentIntentResponse {
        publishable_key: config.publishable_key.clone(),
        client_secret: intent.client_secret,
        intent_id: intent.id,
    })
}

/// Claims the cart's slots once Stripe reports `intent_id` as fully paid.
///
/// The payment must cover both the intent's own amount and the current
/// price of the cart, and the cart must still carry exactly this intent.
/// Repeating an already reconciled intent returns the recorded outcome.
pub async fn reconcile_payment(
    store: &Store,
    payments: &Payments,
    notifier: &Notifier,
    config: &StripeConfig,
    email: &str,
    intent_id: &str,
) -> Result<HandlePaymentResponse, StripeError> {
    let intent = payments.retrieve_payment_intent(intent_id).await?;
    if intent.id != intent_id {
        warn!("Stripe answered {} with intent {}", intent_id, intent.id);
        return Err(StripeError::IntentMismatch(intent_id.to_string()));
    }

    if let Some(done) = store.carts.find_checkout(email, intent_id).await? {
        info!("Intent {} was already reconciled for {}", intent_id, email);
        return Ok(HandlePaymentResponse {
            status: "claimed".to_string(),
            claimed: done.claimed,
            unavailable: done.unavailable,
        });
    }

    let cart = store.carts.get_cart(email).await?;
    let due = amount_due(config, cart.len()).max(intent.amount);
    if intent.amount_received < due {
        warn!(
            "Intent {} received {} of {} due for {}",
            intent_id, intent.amount_received, due, email
        );
        return Err(StripeError::InsufficientPayment {
            received: intent.amount_received,
            due,
        });
    }
    info!("Amount paid: {} cents", intent.amount_received);

    if cart.intent_id.as_deref() != Some(intent_id) {
        warn!(
            "Cart of {} carries {:?}, not {}",
            email, cart.intent_id, intent_id
        );
        return Err(StripeError::IntentMismatch(intent_id.to_string()));
    }

    debug!("Server cart matches intent, claiming times...");
    let checkout = store
        .carts
        .checkout(email, intent_id)
        .await
        .map_err(|e| match e {
            DbError::Conflict(_) => StripeError::IntentMismatch(intent_id.to_string()),
            other => StripeError::Db(other),
        })?;
    info!("Times claimed for {}: {:?}", email, checkout.claimed);

    let message =
        order_confirmation(store, email, &checkout, intent.amount_received, &intent.currency)
            .await;
    match notifier.send_email(message).await {
        Ok(result) => info!("Order confirmation to {}: {}", email, result.status),
        Err(e) => error!("Failed to send order confirmation to {}: {}", email, e),
    }

    Ok(HandlePaymentResponse {
        status: "claimed".to_string(),
        claimed: checkout.claimed,
        unavailable: checkout.unavailable,
    })
}

/// Cancels the cart's outstanding intent at Stripe and unfreezes the cart.
pub async fn cancel_payment_intent(
    store: &Store,
    payments: &Payments,
    email: &str,
) -> Result<CancelPaymentResponse, StripeError> {
    let intent_id = store
        .carts
        .get_cart(email)
        .await?
        .intent_id
        .ok_or(StripeError::NoPendingIntent)?;

    let intent = payments.cancel_payment_intent(&intent_id).await?;
    if !store.carts.clear_intent(email, &intent_id).await? {
        warn!("Intent {} left the cart of {} while cancelling", intent_id, email);
    }
    info!("Cart of {} released from {}", email, intent_id);

    Ok(CancelPaymentResponse {
        status: intent.status,
        intent_id,
    })
}

async fn order_confirmation(
    store: &Store,
    email: &str,
    checkout: &Checkout,
    amount: i64,
    currency: &str,
) -> EmailMessage {
    let mut body = String::from("Thank you for booking with Tutorlink.\n\nYour sessions:\n");
    for id in &checkout.claimed {
        let line = match store.time_slots.find_by_id(*id).await {
            Ok(Some(slot)) => {
                let when = DateTime::from_timestamp(slot.start_time, 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| slot.start_time.to_string());
                match slot.subject {
                    Some(subject) => format!("  - {} with {} ({})\n", when, slot.teacher_email, subject),
                    None => format!("  - {} with {}\n", when, slot.teacher_email),
                }
            }
            _ => format!("  - time slot {}\n", id),
        };
        body.push_str(&line);
    }
    if !checkout.unavailable.is_empty() {
        body.push_str(&format!(
            "\nThese slots were booked by someone else before your payment arrived: {:?}\n",
            checkout.unavailable
        ));
    }
    body.push_str(&format!(
        "\nAmount paid: {}.{:02} {}\n",
        amount / 100,
        amount % 100,
        currency.to_uppercase()
    ));

    EmailMessage {
        to: email.to_string(),
        subject: "Order Confirmation".to_string(),
        body,
        is_html: false,
    }
}

// --- Webhook Processing Logic ---

/// Verifies the `Stripe-Signature` header of a webhook request.
///
/// The header carries `t=<unix>` and one or more `v1=<hex hmac>` entries; the
/// HMAC-SHA256 is taken over `"{t}.{payload}"` with the endpoint secret.
pub fn verify_stripe_signature(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
    now: i64,
) -> Result<(), StripeError> {
    let sig_header_value = sig_header.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing Stripe-Signature header".to_string())
    })?;

    let mut timestamp_str: Option<&str> = None;
    let mut v1_signatures_hex: Vec<&str> = Vec::new();
    for item in sig_header_value.split(',') {
        match item.trim().split_once('=') {
            Some(("t", value)) => timestamp_str = Some(value),
            Some(("v1", value)) => v1_signatures_hex.push(value),
            _ => {} // v0 and unknown schemes
        }
    }

    let timestamp_str = timestamp_str.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing timestamp 't' in Stripe-Signature".to_string())
    })?;
    let parsed_timestamp = timestamp_str.parse::<i64>().map_err(|_| {
        StripeError::WebhookSignatureError(
            "Invalid timestamp format in Stripe-Signature".to_string(),
        )
    })?;
    if v1_signatures_hex.is_empty() {
        return Err(StripeError::WebhookSignatureError(
            "Missing v1 signature in Stripe-Signature".to_string(),
        ));
    }

    if now.abs_diff(parsed_timestamp) > WEBHOOK_TOLERANCE_SECS.unsigned_abs() {
        warn!(
            "Webhook timestamp outside tolerance. Current: {}, Event: {}",
            now, parsed_timestamp
        );
        return Err(StripeError::WebhookSignatureError(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        StripeError::WebhookSignatureError("Invalid webhook secret format for HMAC".to_string())
    })?;
    mac.update(timestamp_str.as_bytes());
    mac.update(b".");
    mac.update(payload_bytes);
    let calculated_signature_hex = hex::encode(mac.finalize().into_bytes());

    let matched = v1_signatures_hex.iter().any(|provided| {
        constant_time_eq::constant_time_eq(calculated_signature_hex.as_bytes(), provided.as_bytes())
    });
    if matched {
        Ok(())
    } else {
        warn!("Stripe signature mismatch");
        Err(StripeError::WebhookSignatureError(
            "Signature mismatch".to_string(),
        ))
    }
}

/// Processes a verified Stripe webhook event.
///
/// Outcomes that retrying cannot change (already reconciled, underpaid) are
/// acknowledged; only internal failures are returned so Stripe retries.
pub async fn process_stripe_webhook(
    event: StripeEvent,
    store: &Store,
    payments: &Payments,
    notifier: &Notifier,
    config: &StripeConfig,
) -> Result<(), StripeError> {
    info!("Processing Stripe event {} ({})", event.id, event.event_type);

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            let intent_id = event.object_id().ok_or_else(|| {
                StripeError::WebhookProcessingError("event object has no id".to_string())
            })?;
            let Some(email) = store.carts.find_by_intent(intent_id).await? else {
                info!("No cart is waiting for {}; nothing to do", intent_id);
                return Ok(());
            };

            match reconcile_payment(store, payments, notifier, config, &email, intent_id).await {
                Ok(result) => {
                    info!("Webhook reconciled {} for {}: {:?}", intent_id, email, result.claimed);
                    Ok(())
                }
                Err(
                    e @ (StripeError::IntentMismatch(_) | StripeError::InsufficientPayment { .. }),
                ) => {
                    warn!("Webhook left {} unreconciled: {}", intent_id, e);
                    Ok(())
                }
                Err(e) => Err(StripeError::WebhookProcessingError(e.to_string())),
            }
        }
        "payment_intent.canceled" => {
            let Some(intent_id) = event.object_id() else {
                return Ok(());
            };
            if let Some(email) = store.carts.find_by_intent(intent_id).await? {
                store.carts.clear_intent(&email, intent_id).await?;
                info!("Intent {} was canceled; cart of {} released", intent_id, email);
            }
            Ok(())
        }
        "payment_intent.payment_failed" => {
            info!("PaymentIntent failed: {:?}", event.object_id());
            Ok(())
        }
        _ => {
            debug!("Received unhandled Stripe event type: {}", event.event_type);
            Ok(())
        }
    }
}
