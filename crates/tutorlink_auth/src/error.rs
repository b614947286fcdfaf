// --- File: crates/tutorlink_auth/src/error.rs ---
use thiserror::Error;
use tutorlink_common::{external_service_error, HttpStatusCode, TutorlinkError};
use tutorlink_db::DbError;

/// Login and session errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing or invalid `[session]` / provider configuration
    #[error("Authentication configuration error: {0}")]
    ConfigError(String),

    /// No provider with this name is enabled
    #[error("Unknown login provider: {0}")]
    UnknownProvider(String),

    /// The `state` returned by the provider does not match the CSRF cookie
    #[error("Login state mismatch")]
    CsrfMismatch,

    /// The provider redirected back with an error instead of a code
    #[error("Login was declined by the provider: {0}")]
    Declined(String),

    /// The token endpoint rejected the authorization code
    #[error("Code exchange failed: {0}")]
    ExchangeError(String),

    /// The userinfo endpoint failed or returned garbage
    #[error("Userinfo request failed: {0}")]
    UserInfoError(String),

    /// The provider did not vouch for an email address
    #[error("Identity provider returned no email")]
    MissingEmail,

    #[error("Not logged in")]
    Unauthenticated,

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<AuthError> for TutorlinkError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ConfigError(msg) => TutorlinkError::ConfigError(msg),
            AuthError::UnknownProvider(name) => {
                TutorlinkError::NotFoundError(format!("login provider {}", name))
            }
            AuthError::CsrfMismatch
            | AuthError::Declined(_)
            | AuthError::MissingEmail
            | AuthError::Unauthenticated => TutorlinkError::AuthError(err.to_string()),
            AuthError::ExchangeError(msg) => external_service_error("OAuth token endpoint", msg),
            AuthError::UserInfoError(msg) => external_service_error("OAuth userinfo endpoint", msg),
            AuthError::Db(e) => e.into(),
        }
    }
}

impl HttpStatusCode for AuthError {
    fn status_code(&self) -> u16 {
        match self {
            AuthError::ConfigError(_) => 500,
            AuthError::UnknownProvider(_) => 404,
            AuthError::CsrfMismatch
            | AuthError::Declined(_)
            | AuthError::MissingEmail
            | AuthError::Unauthenticated => 401,
            AuthError::ExchangeError(_) | AuthError::UserInfoError(_) => 502,
            AuthError::Db(e) => e.status_code(),
        }
    }
}
