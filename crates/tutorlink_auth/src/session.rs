//! Server-side sessions carried in a signed cookie or a bearer token.
//!
//! The session token is a random id stored in the `sessions` table. Browsers
//! get it in a signed cookie; API clients may send `Authorization: Bearer`.
//! The short-lived OAuth CSRF state travels in a private (encrypted) cookie
//! under the same key.

use crate::error::AuthError;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use cookie::{Cookie, CookieJar, Key, SameSite};
use sha2::{Digest, Sha512};
use tracing::{debug, info, warn};
use tutorlink_config::SessionConfig;
use tutorlink_db::{Session, SessionRepository, SqlSessionRepository};

pub const CSRF_COOKIE_NAME: &str = "tutorlink_oauth_state";
const MIN_SECRET_LEN: usize = 32;
const CSRF_TTL_MINUTES: i64 = 10;

pub struct SessionManager {
    key: Key,
    cookie_name: String,
    ttl_secs: i64,
    secure: bool,
    sessions: SqlSessionRepository,
}

impl SessionManager {
    pub fn new(config: &SessionConfig, sessions: SqlSessionRepository) -> Result<Self, AuthError> {
        if config.secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::ConfigError(format!(
                "session.secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        // Key wants 64 bytes of material; stretch the configured secret.
        let digest = Sha512::digest(config.secret.as_bytes());
        let key = Key::try_from(digest.as_slice())
            .map_err(|e| AuthError::ConfigError(format!("session key: {}", e)))?;

        Ok(Self {
            key,
            cookie_name: config.cookie_name.clone(),
            ttl_secs: config.ttl_secs,
            secure: config.secure_cookies,
            sessions,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Creates a session for `email` and returns it with its signed cookie.
    /// `name` is the provider's display name, kept for registration.
    pub async fn start(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<(Session, Cookie<'static>), AuthError> {
        let now = chrono::Utc::now().timestamp();
        let expired = self.sessions.purge_expired(now - self.ttl_secs).await?;
        if expired > 0 {
            debug!("Dropped {} expired sessions", expired);
        }

        let session = self.sessions.create(email, name, now).await?;
        let cookie = Cookie::build((self.cookie_name.clone(), session.token.clone()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::seconds(self.ttl_secs))
            .build();

        info!("Logged in {}", email);
        Ok((session, self.sign(cookie)))
    }

    /// The caller's session if the request carries a live one.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError> {
        let Some(token) = self.token_from(headers) else {
            return Ok(None);
        };
        let not_before = chrono::Utc::now().timestamp() - self.ttl_secs;
        Ok(self.sessions.find_valid(&token, not_before).await?)
    }

    /// Revokes the caller's session, if any, and returns the cookie that clears it.
    pub async fn end(&self, headers: &HeaderMap) -> Result<Cookie<'static>, AuthError> {
        if let Some(token) = self.token_from(headers) {
            if self.sessions.revoke(&token).await? {
                info!("Logged out");
            }
        }
        Ok(removal(&self.cookie_name))
    }

    /// Encrypted cookie holding the OAuth `state` until the provider redirects back.
    pub fn csrf_cookie(&self, state: &str) -> Cookie<'static> {
        let cookie = Cookie::build((CSRF_COOKIE_NAME, state.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::minutes(CSRF_TTL_MINUTES))
            .build();

        let mut jar = CookieJar::new();
        jar.private_mut(&self.key).add(cookie);
        jar.get(CSRF_COOKIE_NAME)
            .cloned()
            .unwrap_or_else(|| removal(CSRF_COOKIE_NAME))
    }

    /// The OAuth `state` stored by [`Self::csrf_cookie`], if it decrypts.
    pub fn csrf_state(&self, headers: &HeaderMap) -> Option<String> {
        let jar = jar_from(headers);
        let state = jar
            .private(&self.key)
            .get(CSRF_COOKIE_NAME)
            .map(|c| c.value().to_string());
        if state.is_none() && jar.get(CSRF_COOKIE_NAME).is_some() {
            warn!("CSRF state cookie failed to decrypt");
        }
        state
    }

    pub fn csrf_removal(&self) -> Cookie<'static> {
        removal(CSRF_COOKIE_NAME)
    }

    fn sign(&self, cookie: Cookie<'static>) -> Cookie<'static> {
        let name = cookie.name().to_string();
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        jar.get(&name).cloned().unwrap_or_else(|| removal(&name))
    }

    fn token_from(&self, headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if bearer.is_some() {
            return bearer;
        }

        jar_from(headers)
            .signed(&self.key)
            .get(&self.cookie_name)
            .map(|c| c.value().to_string())
    }
}

/// Parses every `Cookie` header of a request into a jar of originals.
pub fn jar_from(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    for value in headers.get_all(COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for pair in raw.split(';') {
            if let Ok(cookie) = Cookie::parse(pair.trim().to_string()) {
                jar.add_original(cookie);
            }
        }
    }
    jar
}

fn removal(name: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name.to_string(), "")).path("/").build();
    cookie.make_removal();
    cookie
}
