// --- File: crates/tutorlink_stripe/src/routes.rs ---
use crate::handlers::{
    cancel_payment_intent_handler, create_payment_intent_handler, handle_payment_handler,
    stripe_webhook_handler, PaymentState,
};
use axum::{middleware, routing::post, Router};
use std::sync::Arc;
use tutorlink_auth::{require_session, SessionManager};

/// Payment routes, relative to `/api`. The webhook authenticates by
/// signature instead of a session.
pub fn routes(state: Arc<PaymentState>, sessions: Arc<SessionManager>) -> Router {
    let checkout = Router::new()
        .route(
            "/create-payment-intent",
            post(create_payment_intent_handler),
        )
        .route("/handle-payment", post(handle_payment_handler))
        .route(
            "/cancel-payment-intent",
            post(cancel_payment_intent_handler),
        )
        .route_layer(middleware::from_fn_with_state(sessions, require_session));

    Router::new()
        .route("/stripe/webhook", post(stripe_webhook_handler))
        .merge(checkout)
        .with_state(state)
}
