use crate::error::config_error::ConfigError;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{error, info, warn};

static CONFIG: OnceLock<HashMap<String, String>> = OnceLock::new();

/// Default configuration values
const DEFAULTS: &[(&str, &str)] = &[
    ("SERVER_ADDRESS", "127.0.0.1"),
    ("SERVER_PORT", "8050"),
    ("REQUEST_TIMEOUT_SECONDS", "30"),
    ("INVITE_TTL_HOURS", "72"),
    ("LOG_LEVEL", "info"),
];

/// Parameters that must come from the environment. Listed here so they are
/// picked up from `.env` even though they carry no default.
const REQUIRED: &[&str] = &[
    "DATABASE_URL",
    "AUTH_JWT_ACCESS_SECRET",
    "AUTH_JWT_ACCESS_TOKEN_EXPIRES_IN",
    "AUTH_JWT_REFRESH_SECRET",
    "AUTH_JWT_REFRESH_TOKEN_EXPIRES_IN",
    "INVITE_TOKEN_SALT",
];

const OPTIONAL: &[&str] = &[
    "ENV",
    "DB_MAX_CONNECTIONS",
    "DB_MIN_CONNECTIONS",
    "DB_ACQUIRE_TIMEOUT_SECONDS",
    "DB_IDLE_TIMEOUT_SECONDS",
    "DB_MAX_LIFETIME_SECONDS",
];

pub fn init() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment file: {:?}", path),
        Err(_) => warn!("No .env file found, using system environment variables"),
    }

    let mut config = HashMap::new();

    for (key, value) in DEFAULTS {
        config.insert(key.to_string(), value.to_string());
    }

    let overridable = DEFAULTS
        .iter()
        .map(|(key, _)| *key)
        .chain(REQUIRED.iter().copied())
        .chain(OPTIONAL.iter().copied());
    for key in overridable {
        if let Ok(value) = std::env::var(key) {
            config.insert(key.to_string(), value);
        }
    }

    if CONFIG.set(config).is_err() {
        error!("Configuration already initialized");
    } else {
        info!("Configuration initialized successfully");
    }
}

pub fn get_optional(parameter: &str) -> Option<String> {
    CONFIG
        .get()
        .and_then(|config| config.get(parameter))
        .cloned()
        .filter(|value| !value.trim().is_empty())
}

pub fn get_required(parameter: &str) -> Result<String, ConfigError> {
    get_optional(parameter).ok_or_else(|| {
        error!("Configuration parameter '{}' not found", parameter);
        ConfigError::Missing(parameter.to_string())
    })
}

pub fn get_u64(parameter: &str) -> Result<u64, ConfigError> {
    let value = get_required(parameter)?;
    value.parse::<u64>().map_err(|_| {
        error!("Configuration parameter '{}' is not a valid u64: {}", parameter, value);
        ConfigError::Invalid {
            name: parameter.to_string(),
            reason: format!("expected an unsigned integer, got '{value}'"),
        }
    })
}

pub fn get_u64_or(parameter: &str, default: u64) -> u64 {
    get_optional(parameter)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

