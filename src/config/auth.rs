use crate::config::parameter;
use crate::error::config_error::ConfigError;
use chrono::Duration;
use tracing::info;

/// Minimum HMAC secret length (256 bits).
pub const MIN_SECRET_LEN: usize = 32;

/// Signing configuration for the credential issuer.
///
/// Built once at startup and shared behind an `Arc`. Access and refresh tokens
/// use independent secrets and lifetimes.
#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub access_expires_in: Duration,
    pub refresh_secret: String,
    pub refresh_expires_in: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("access_expires_in", &self.access_expires_in)
            .field("refresh_secret", &"<redacted>")
            .field("refresh_expires_in", &self.refresh_expires_in)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(
        access_secret: impl Into<String>,
        access_expires_in: Duration,
        refresh_secret: impl Into<String>,
        refresh_expires_in: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            access_secret: access_secret.into(),
            access_expires_in,
            refresh_secret: refresh_secret.into(),
            refresh_expires_in,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads the four signing parameters. Every one of them is required.
    pub fn from_parameters() -> Result<Self, ConfigError> {
        let access_secret = parameter::get_required("AUTH_JWT_ACCESS_SECRET")?;
        let access_expires_in = parse_expires_in(
            "AUTH_JWT_ACCESS_TOKEN_EXPIRES_IN",
            &parameter::get_required("AUTH_JWT_ACCESS_TOKEN_EXPIRES_IN")?,
        )?;
        let refresh_secret = parameter::get_required("AUTH_JWT_REFRESH_SECRET")?;
        let refresh_expires_in = parse_expires_in(
            "AUTH_JWT_REFRESH_TOKEN_EXPIRES_IN",
            &parameter::get_required("AUTH_JWT_REFRESH_TOKEN_EXPIRES_IN")?,
        )?;

        let config = Self::new(access_secret, access_expires_in, refresh_secret, refresh_expires_in)?;
        info!(
            "SECURITY: Token signing configured: access ttl={}s, refresh ttl={}s",
            config.access_expires_in.num_seconds(),
            config.refresh_expires_in.num_seconds()
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, secret) in [
            ("AUTH_JWT_ACCESS_SECRET", &self.access_secret),
            ("AUTH_JWT_REFRESH_SECRET", &self.refresh_secret),
        ] {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::Invalid {
                    name: name.to_string(),
                    reason: format!(
                        "secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                        secret.len()
                    ),
                });
            }
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Invalid {
                name: "AUTH_JWT_REFRESH_SECRET".to_string(),
                reason: "must differ from AUTH_JWT_ACCESS_SECRET".to_string(),
            });
        }
        Ok(())
    }
}

/// Parses an expiry such as `900`, `15m`, `12h` or `7d`. A bare number is seconds.
pub fn parse_expires_in(name: &str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        name: name.to_string(),
        reason: format!("{reason}: '{value}'"),
    };

    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let amount: i64 = digits
        .parse()
        .map_err(|_| invalid("expected a number optionally followed by s, m, h or d"))?;
    if amount <= 0 {
        return Err(invalid("expiry must be positive"));
    }

    let duration = match unit {
        "" | "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => return Err(invalid("unknown unit")),
    };
    duration.ok_or_else(|| invalid("expiry is out of range"))
}
