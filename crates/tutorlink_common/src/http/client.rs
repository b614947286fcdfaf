// --- File: crates/tutorlink_common/src/http/client.rs ---
use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Default timeout for outbound requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Shared client for Stripe, OAuth token and userinfo calls.
pub static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
});
