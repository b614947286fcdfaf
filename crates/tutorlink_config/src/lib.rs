// --- File: crates/tutorlink_config/src/lib.rs ---
//! Runtime configuration for Tutorlink.
//!
//! The configuration is loaded once at startup into an immutable [`AppConfig`]
//! and handed to every component as `Arc<AppConfig>`.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use tracing::debug;

pub mod env_vars;
pub mod models;

pub use models::*;

/// Loads `config/default`, `config/{RUN_ENV}` and `TUTORLINK__*` environment
/// overrides, then resolves `secret_from_env` markers.
///
/// The config directory defaults to `./config` and can be moved with `CONFIG_DIR`.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env_vars::get_config_prefix();
    let config_dir = PathBuf::from(env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        "Loading configuration from {} and {} (prefix {})",
        default_path.display(),
        env_path.display(),
        prefix
    );

    let raw_config: AppConfig = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .prefix_separator(env_vars::CONFIG_SEPARATOR)
                .separator(env_vars::CONFIG_SEPARATOR),
        )
        .build()?
        .try_deserialize()?;

    apply_env_overrides_from_marker(raw_config)
}

/// Replaces every `secret_from_env` value in the config with its environment
/// variable. Unresolved markers are left in place and logged.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|e| ConfigError::Message(format!("failed to serialize config: {e}")))?;
    env_vars::inject_env_secrets(&mut json);
    serde_json::from_value(json)
        .map_err(|e| ConfigError::Message(format!("failed to rebuild config: {e}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads `.env` (or the file named by `DOTENV_OVERRIDE`) into the process
/// environment exactly once. Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
