// --- File: crates/tutorlink_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL, e.g. `https://tutorlink.example`. Used in emails.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            public_url: None,
        }
    }
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/tutorlink.db, loaded via TUTORLINK__DATABASE__URL
}

// --- Session Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Master secret for the cookie signing/encryption key. At least 32 bytes.
    pub secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: i64,
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_cookie_name() -> String {
    "tutorlink_session".to_string()
}

fn default_session_ttl() -> i64 {
    7 * 24 * 60 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_name: default_cookie_name(),
            ttl_secs: default_session_ttl(),
            secure_cookies: false,
        }
    }
}

// --- OAuth provider Config (Google, Cognito) ---
// client_secret is normally "secret_from_env" -> GOOGLE_CLIENT_SECRET / COGNITO_CLIENT_SECRET
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub redirect_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

// --- Stripe Config ---
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PriceTier {
    /// Number of sessions in the cart this tier applies to.
    pub sessions: usize,
    /// Per-session price in the smallest currency unit.
    pub unit_amount: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StripeConfig {
    pub secret_key: String, // STRIPE_SECRET_KEY via secret_from_env
    pub publishable_key: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Overrides `https://api.stripe.com`.
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub webhook_secret: Option<String>, // STRIPE_WEBHOOK_SECRET
    #[serde(default = "default_price_tiers")]
    pub price_tiers: Vec<PriceTier>,
    #[serde(default = "default_unit_amount")]
    pub default_unit_amount: i64,
}

fn default_currency() -> String {
    "usd".to_string()
}

pub fn default_price_tiers() -> Vec<PriceTier> {
    vec![
        PriceTier {
            sessions: 1,
            unit_amount: 2500,
        },
        PriceTier {
            sessions: 2,
            unit_amount: 2300,
        },
    ]
}

pub fn default_unit_amount() -> i64 {
    2100
}

// --- Email Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: String,
    pub password: String, // EMAIL_PASSWORD
    /// Mailbox used as sender, e.g. `Tutorlink <noreply@tutorlink.example>`.
    pub from: String,
    #[serde(default = "default_true")]
    pub starttls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

// --- Logging Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_stripe: bool,
    #[serde(default)]
    pub use_google: bool,
    #[serde(default)]
    pub use_cognito: bool,
    #[serde(default)]
    pub use_email: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub google: Option<OAuthProviderConfig>,
    #[serde(default)]
    pub cognito: Option<OAuthProviderConfig>,
    #[serde(default)]
    pub stripe: Option<StripeConfig>,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}
