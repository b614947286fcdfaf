// --- File: crates/tutorlink_auth/src/routes.rs ---

use crate::handlers::{
    callback_handler, index_handler, login_handler, logout_handler, provider_authorized_handler,
    provider_login_handler, AuthState,
};
use axum::{routing::get, Router};
use std::sync::Arc;

/// Browser-facing pages: index, login, provider callbacks and logout.
/// Mounted at the root, not under `/api`.
pub fn routes(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_handler))
        .route("/callback", get(callback_handler))
        .route("/logout", get(logout_handler))
        .route("/login/{provider}", get(provider_login_handler))
        .route("/login/{provider}/authorized", get(provider_authorized_handler))
        .with_state(state)
}
