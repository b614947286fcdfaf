// --- File: crates/tutorlink_auth/src/handlers.rs ---
use crate::error::AuthError;
use crate::session::SessionManager;
use crate::views::{render_index, render_login_failed};
use axum::{
    extract::{Path, Query, State},
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Response},
};
use cookie::Cookie;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use tutorlink_common::services::IdentityService;
use tutorlink_common::TutorlinkError;

pub type DynIdentityService = Arc<dyn IdentityService<Error = AuthError>>;

/// Enabled login providers and the session manager.
pub struct AuthState {
    pub sessions: Arc<SessionManager>,
    /// In preference order; the first one backs `/login` and `/callback`.
    providers: Vec<DynIdentityService>,
}

impl AuthState {
    pub fn new(sessions: Arc<SessionManager>, providers: Vec<DynIdentityService>) -> Self {
        Self {
            sessions,
            providers,
        }
    }

    fn primary(&self) -> Result<&DynIdentityService, AuthError> {
        self.providers
            .first()
            .ok_or_else(|| AuthError::ConfigError("no login provider is enabled".to_string()))
    }

    fn provider(&self, name: &str) -> Result<&DynIdentityService, AuthError> {
        self.providers
            .iter()
            .find(|p| p.provider_name() == name)
            .ok_or_else(|| AuthError::UnknownProvider(name.to_string()))
    }
}

/// Query the provider appends when redirecting back.
#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[axum::debug_handler]
pub async fn index_handler(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
) -> Result<Html<String>, TutorlinkError> {
    let session = state.sessions.resolve(&headers).await?;
    Ok(Html(render_index(session.map(|s| s.email).as_deref())))
}

#[axum::debug_handler]
pub async fn login_handler(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
) -> Result<Response, TutorlinkError> {
    if state.sessions.resolve(&headers).await?.is_some() {
        return Ok("You are logged in!".into_response());
    }
    let provider = state.primary()?;
    Ok(begin_login(&state.sessions, provider.as_ref()))
}

#[axum::debug_handler]
pub async fn provider_login_handler(
    State(state): State<Arc<AuthState>>,
    Path(provider): Path<String>,
) -> Result<Response, TutorlinkError> {
    let provider = state.provider(&provider)?;
    Ok(begin_login(&state.sessions, provider.as_ref()))
}

/// Return leg of the primary provider (the Cognito hosted UI in production).
#[axum::debug_handler]
pub async fn callback_handler(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    match state.primary() {
        Ok(provider) => finish_login(&state.sessions, provider.as_ref(), &headers, query).await,
        Err(e) => TutorlinkError::from(e).into_response(),
    }
}

#[axum::debug_handler]
pub async fn provider_authorized_handler(
    State(state): State<Arc<AuthState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    match state.provider(&provider) {
        Ok(provider) => finish_login(&state.sessions, provider.as_ref(), &headers, query).await,
        Err(e) => TutorlinkError::from(e).into_response(),
    }
}

#[axum::debug_handler]
pub async fn logout_handler(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
) -> Result<Response, TutorlinkError> {
    let cleared = state.sessions.end(&headers).await?;
    Ok(with_cookies(found("/"), &[cleared]))
}

fn begin_login(
    sessions: &SessionManager,
    provider: &dyn IdentityService<Error = AuthError>,
) -> Response {
    let request = provider.authorization_request();
    info!("Redirecting to {} login", provider.provider_name());
    with_cookies(
        found(&request.url),
        &[sessions.csrf_cookie(&request.csrf_state)],
    )
}

async fn finish_login(
    sessions: &SessionManager,
    provider: &dyn IdentityService<Error = AuthError>,
    headers: &HeaderMap,
    query: CallbackQuery,
) -> Response {
    let outcome = complete_login(sessions, provider, headers, query).await;
    let csrf_cleared = sessions.csrf_removal();

    match outcome {
        Ok((email, session_cookie)) => with_cookies(
            Html(render_index(Some(&email))).into_response(),
            &[csrf_cleared, session_cookie],
        ),
        Err(e) => {
            warn!("{} login failed: {}", provider.provider_name(), e);
            let status = match e {
                AuthError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            };
            with_cookies(
                (status, Html(render_login_failed(&e.to_string()))).into_response(),
                &[csrf_cleared],
            )
        }
    }
}

async fn complete_login(
    sessions: &SessionManager,
    provider: &dyn IdentityService<Error = AuthError>,
    headers: &HeaderMap,
    query: CallbackQuery,
) -> Result<(String, Cookie<'static>), AuthError> {
    if let Some(reason) = query.error {
        return Err(AuthError::Declined(reason));
    }

    let expected = sessions.csrf_state(headers).ok_or(AuthError::CsrfMismatch)?;
    if query.state.as_deref() != Some(expected.as_str()) {
        return Err(AuthError::CsrfMismatch);
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::Declined("no authorization code".to_string()))?;

    let claims = provider.exchange_code(&code).await?;
    let (_, cookie) = sessions.start(&claims.email, claims.name.as_deref()).await?;
    Ok((claims.email, cookie))
}

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(e) => {
            error!("Redirect target is not a valid header: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Appends one `Set-Cookie` header per cookie.
pub(crate) fn with_cookies(mut response: Response, cookies: &[Cookie<'static>]) -> Response {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => error!("Cookie {} is not a valid header: {}", cookie.name(), e),
        }
    }
    response
}
