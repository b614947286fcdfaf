//! Session guard for protected routes.

use crate::error::AuthError;
use crate::handlers::found;
use crate::session::SessionManager;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::ACCEPT;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{debug, error};
use tutorlink_common::TutorlinkError;

/// The logged-in caller, inserted by [`require_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub email: String,
    /// Display name from the identity provider, when it sent one.
    pub name: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = TutorlinkError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}

/// Rejects requests without a live session. Browsers are sent to `/login`,
/// everything else gets a 401 JSON error.
pub async fn require_session(
    State(sessions): State<Arc<SessionManager>>,
    mut req: Request,
    next: Next,
) -> Response {
    match sessions.resolve(req.headers()).await {
        Ok(Some(session)) => {
            req.extensions_mut().insert(CurrentUser {
                email: session.email,
                name: session.name,
            });
            next.run(req).await
        }
        Ok(None) => {
            debug!("Unauthenticated request to {}", req.uri().path());
            if wants_html(req.headers()) {
                found("/login")
            } else {
                TutorlinkError::from(AuthError::Unauthenticated).into_response()
            }
        }
        Err(e) => {
            error!("Session lookup failed: {}", e);
            TutorlinkError::from(e).into_response()
        }
    }
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}
