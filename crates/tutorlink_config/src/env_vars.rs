//! Environment variable naming for Tutorlink configuration.
//!
//! Plain settings are overridden with `TUTORLINK__SECTION__KEY`. Secrets are
//! written as `secret_from_env` in the config files and resolved from
//! `TUTORLINK_SECRET_SECTION_KEY`, falling back to `SECTION_KEY`
//! (e.g. `STRIPE_SECRET_KEY`).

use serde_json::Value;
use std::env;
use tracing::warn;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "TUTORLINK";

/// The prefix for secret environment variables
pub const SECRET_PREFIX: &str = "TUTORLINK_SECRET";

/// Marker value that asks for a value to be read from the environment
pub const SECRET_MARKER: &str = "secret_from_env";

pub const CONFIG_SEPARATOR: &str = "__";
pub const SECRET_SEPARATOR: &str = "_";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// `server.host` -> `TUTORLINK__SERVER__HOST`
pub fn config_path_to_env_var(path: &str) -> String {
    let prefix = get_config_prefix();
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// `stripe.secret_key` -> `TUTORLINK_SECRET_STRIPE_SECRET_KEY`
pub fn secret_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', SECRET_SEPARATOR);
    format!("{}{}{}", SECRET_PREFIX, SECRET_SEPARATOR, path).to_uppercase()
}

/// `stripe.secret_key` -> `STRIPE_SECRET_KEY`
pub fn legacy_secret_path_to_env_var(path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() < 2 {
        return path.to_uppercase();
    }

    let service = parts[0];
    let key = parts[1..].join(SECRET_SEPARATOR);
    format!("{}_{}", service, key).to_uppercase()
}

/// Looks up a secret, trying the prefixed name before the legacy one.
pub fn get_secret_env_var(path: &str) -> Option<String> {
    env::var(secret_path_to_env_var(path))
        .or_else(|_| env::var(legacy_secret_path_to_env_var(path)))
        .ok()
}

/// Replaces every `secret_from_env` string in `value` with the matching
/// environment variable. Returns the dotted paths that could not be resolved.
pub fn inject_env_secrets(value: &mut Value) -> Vec<String> {
    fn walk(path: &mut Vec<String>, obj: &mut Value, missing: &mut Vec<String>) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.clone());
                    walk(path, v, missing);
                    path.pop();
                }
            }
            Value::Array(arr) => {
                for (i, v) in arr.iter_mut().enumerate() {
                    path.push(i.to_string());
                    walk(path, v, missing);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let path_str = path.join(".");
                match get_secret_env_var(&path_str) {
                    Some(env_val) => *s = env_val,
                    None => {
                        warn!("No environment value found for secret '{}'", path_str);
                        missing.push(path_str);
                    }
                }
            }
            _ => {}
        }
    }

    let mut missing = Vec::new();
    walk(&mut Vec::new(), value, &mut missing);
    missing
}
