// --- File: crates/tutorlink_stripe/src/error.rs ---
use thiserror::Error;
use tutorlink_common::{external_service_error, HttpStatusCode, TutorlinkError};
use tutorlink_db::DbError;

/// Stripe-specific error types.
#[derive(Error, Debug)]
pub enum StripeError {
    /// Error occurred during a Stripe API request
    #[error("Stripe API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the Stripe API
    #[error("Stripe API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// Error parsing Stripe API response
    #[error("Failed to parse Stripe API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or incomplete Stripe configuration
    #[error("Stripe configuration missing or incomplete")]
    ConfigError,

    /// `use_stripe` is off
    #[error("Payments are disabled")]
    Disabled,

    #[error("Cart is empty")]
    EmptyCart,

    /// The cart already carries an unresolved intent
    #[error("Intent {0} already created")]
    IntentPending(String),

    #[error("No payment is pending for this cart")]
    NoPendingIntent,

    #[error("Missing required field 'intentId'")]
    MissingIntentId,

    #[error("Invalid payment intent id '{0}'")]
    InvalidIntentId(String),

    /// Less was captured than the cart costs
    #[error("Received {received} of {due} due")]
    InsufficientPayment { received: i64, due: i64 },

    /// The intent is not the one recorded on the caller's cart
    #[error("Payment {0} does not match the current cart")]
    IntentMismatch(String),

    /// Webhook signature verification failed
    #[error("Stripe webhook signature verification failed: {0}")]
    WebhookSignatureError(String),

    /// Webhook event processing error
    #[error("Stripe webhook event processing error: {0}")]
    WebhookProcessingError(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl StripeError {
    /// Failures that originate at Stripe rather than in our own state.
    pub fn is_processor_error(&self) -> bool {
        matches!(
            self,
            StripeError::RequestError(_) | StripeError::ApiError { .. } | StripeError::ParseError(_)
        )
    }
}

/// Convert StripeError to TutorlinkError
impl From<StripeError> for TutorlinkError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::RequestError(e) => {
                TutorlinkError::HttpError(format!("Stripe request error: {}", e))
            }
            StripeError::ApiError {
                status_code,
                message,
            } => external_service_error(
                "Stripe API",
                format!("Status: {}, Message: {}", status_code, message),
            ),
            StripeError::ParseError(e) => {
                external_service_error("Stripe API", format!("unreadable response: {}", e))
            }
            StripeError::ConfigError => TutorlinkError::ConfigError(err.to_string()),
            StripeError::Disabled => TutorlinkError::ServiceUnavailable(err.to_string()),
            StripeError::EmptyCart
            | StripeError::MissingIntentId
            | StripeError::InvalidIntentId(_) => TutorlinkError::ValidationError(err.to_string()),
            StripeError::IntentPending(_)
            | StripeError::NoPendingIntent
            | StripeError::IntentMismatch(_) => TutorlinkError::ConflictError(err.to_string()),
            StripeError::InsufficientPayment { .. } => {
                TutorlinkError::PaymentRequiredError(err.to_string())
            }
            StripeError::WebhookSignatureError(msg) => {
                TutorlinkError::ValidationError(format!("Invalid signature: {}", msg))
            }
            StripeError::WebhookProcessingError(msg) => {
                TutorlinkError::InternalError(format!("Webhook processing error: {}", msg))
            }
            StripeError::Db(e) => e.into(),
        }
    }
}

impl HttpStatusCode for StripeError {
    fn status_code(&self) -> u16 {
        match self {
            StripeError::RequestError(_)
            | StripeError::ApiError { .. }
            | StripeError::ParseError(_) => 502,
            StripeError::ConfigError => 500,
            StripeError::Disabled => 503,
            StripeError::EmptyCart
            | StripeError::MissingIntentId
            | StripeError::InvalidIntentId(_)
            | StripeError::WebhookSignatureError(_) => 400,
            StripeError::InsufficientPayment { .. } => 402,
            StripeError::IntentPending(_)
            | StripeError::NoPendingIntent
            | StripeError::IntentMismatch(_) => 409,
            StripeError::WebhookProcessingError(_) => 500,
            StripeError::Db(e) => e.status_code(),
        }
    }
}
