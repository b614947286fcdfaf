// --- File: crates/services/tutorlink_backend/src/error.rs ---
use thiserror::Error;
use tutorlink_auth::AuthError;
use tutorlink_db::DbError;
use tutorlink_notify::NotifyError;
use tutorlink_stripe::StripeError;

/// Anything that keeps the service from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to load config: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database unavailable: {0}")]
    Db(#[from] DbError),

    #[error("Login setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Stripe setup failed: {0}")]
    Stripe(#[from] StripeError),

    #[error("Email setup failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
