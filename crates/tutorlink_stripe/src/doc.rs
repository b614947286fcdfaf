// --- File: crates/tutorlink_stripe/src/doc.rs ---
#![allow(dead_code)]
use utoipa::OpenApi;

use crate::logic::{
    CancelPaymentResponse, CreatePaymentIntentResponse, HandlePaymentRequest,
    HandlePaymentResponse,
};
use tutorlink_common::ErrorBody;

/// Prices the caller's cart and opens a Stripe PaymentIntent for it.
#[utoipa::path(
    post,
    path = "/create-payment-intent", // Path relative to /api
    responses(
        (status = 200, description = "Intent created and recorded on the cart", body = CreatePaymentIntentResponse),
        (status = 400, description = "Cart is empty", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 403, description = "Stripe refused the intent; body is {\"error\": message}"),
        (status = 409, description = "An intent is already pending", body = ErrorBody),
        (status = 503, description = "Payments disabled", body = ErrorBody)
    ),
    tag = "Payments"
)]
fn doc_create_payment_intent() {}

/// Claims the cart's slots once the intent is paid in full.
#[utoipa::path(
    post,
    path = "/handle-payment",
    request_body(content = HandlePaymentRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Slots claimed", body = HandlePaymentResponse),
        (status = 400, description = "intentId missing", body = ErrorBody),
        (status = 402, description = "Payment does not cover the cart", body = ErrorBody),
        (status = 409, description = "Intent does not match the cart", body = ErrorBody),
        (status = 502, description = "Stripe unreachable", body = ErrorBody)
    ),
    tag = "Payments"
)]
fn doc_handle_payment() {}

#[utoipa::path(
    post,
    path = "/cancel-payment-intent",
    responses(
        (status = 200, description = "Intent canceled and cart released", body = CancelPaymentResponse),
        (status = 409, description = "No payment pending", body = ErrorBody)
    ),
    tag = "Payments"
)]
fn doc_cancel_payment_intent() {}

#[utoipa::path(
    post,
    path = "/stripe/webhook",
    responses(
        (status = 200, description = "Webhook received and acknowledged"),
        (status = 400, description = "Invalid signature or payload", body = ErrorBody),
        (status = 500, description = "Internal Server Error processing webhook", body = ErrorBody)
    ),
    tag = "Stripe Webhooks"
)]
fn doc_stripe_webhook() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_create_payment_intent,
        doc_handle_payment,
        doc_cancel_payment_intent,
        doc_stripe_webhook
    ),
    components(schemas(
        CreatePaymentIntentResponse,
        HandlePaymentRequest,
        HandlePaymentResponse,
        CancelPaymentResponse
    )),
    tags(
        (name = "Payments", description = "Paying for a cart with Stripe"),
        (name = "Stripe Webhooks", description = "Notifications sent by Stripe")
    )
)]
pub struct StripeApiDoc;
