use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required configuration parameter '{0}' is missing")]
    Missing(String),
    #[error("Configuration parameter '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },
}
