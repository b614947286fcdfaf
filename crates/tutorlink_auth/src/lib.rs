// --- File: crates/tutorlink_auth/src/lib.rs ---
//! Login and sessions for Tutorlink.
//!
//! Users log in through an OAuth provider (a Cognito hosted UI and/or Google).
//! A successful callback starts a server-side session whose token is handed
//! to the browser in a signed cookie. [`require_session`] guards the API.

pub mod error;
pub mod handlers;
#[cfg(test)]
mod handlers_test;
pub mod middleware;
pub mod provider;
pub mod routes;
pub mod session;
pub mod views;

use std::sync::Arc;
use tracing::info;
use tutorlink_config::AppConfig;

pub use error::AuthError;
pub use handlers::{AuthState, DynIdentityService};
pub use middleware::{require_session, CurrentUser};
pub use provider::OAuthIdentityService;
pub use routes::routes;
pub use session::SessionManager;

/// Identity services for every enabled provider, Cognito first.
pub fn providers_from_config(config: &AppConfig) -> Result<Vec<DynIdentityService>, AuthError> {
    let candidates = [
        ("cognito", config.use_cognito, config.cognito.as_ref()),
        ("google", config.use_google, config.google.as_ref()),
    ];

    let mut providers: Vec<DynIdentityService> = Vec::new();
    for (name, enabled, section) in candidates {
        if !enabled {
            continue;
        }
        let section = section.ok_or_else(|| {
            AuthError::ConfigError(format!("use_{} is set but [{}] is missing", name, name))
        })?;
        providers.push(Arc::new(OAuthIdentityService::new(name, section)?));
        info!("Login provider enabled: {}", name);
    }
    Ok(providers)
}
