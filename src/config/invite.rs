use crate::config::parameter;
use crate::error::config_error::ConfigError;
use chrono::Duration;

#[derive(Clone)]
pub struct InviteConfig {
    /// Base64 (unpadded) salt fed to the invite token hasher.
    pub token_salt: String,
    pub ttl: Duration,
}

impl InviteConfig {
    pub fn from_parameters() -> Result<Self, ConfigError> {
        let token_salt = parameter::get_required("INVITE_TOKEN_SALT")?;
        let ttl_hours = parameter::get_u64("INVITE_TTL_HOURS")?;
        let ttl = i64::try_from(ttl_hours)
            .ok()
            .filter(|hours| *hours > 0)
            .and_then(Duration::try_hours)
            .ok_or_else(|| ConfigError::Invalid {
                name: "INVITE_TTL_HOURS".to_string(),
                reason: format!("out of range: {ttl_hours}"),
            })?;

        Ok(Self { token_salt, ttl })
    }
}
