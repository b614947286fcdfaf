// --- File: crates/tutorlink_stripe/src/lib.rs ---
//! Paying for a cart with Stripe PaymentIntents.
//!
//! Creating an intent freezes the cart; a fully paid intent whose id matches
//! the cart claims every slot in one transaction and sends an order
//! confirmation. Stripe's `payment_intent.succeeded` webhook runs the same
//! reconciliation for browsers that never come back.

#[cfg(feature = "openapi")]
pub mod doc;
pub mod error;
pub mod handlers;
#[cfg(test)]
mod handlers_test;
pub mod logic;
pub mod pricing;
pub mod routes;
pub mod service;

use std::sync::Arc;
use tutorlink_config::AppConfig;

pub use error::StripeError;
pub use handlers::{DynPaymentService, PaymentState};
pub use routes::routes;
pub use service::StripePaymentService;

/// The Stripe client when `use_stripe` is on, `None` otherwise.
pub fn payments_from_config(config: &AppConfig) -> Result<Option<DynPaymentService>, StripeError> {
    if !config.use_stripe {
        return Ok(None);
    }
    let stripe = config.stripe.as_ref().ok_or(StripeError::ConfigError)?;
    Ok(Some(Arc::new(StripePaymentService::new(stripe)?)))
}
