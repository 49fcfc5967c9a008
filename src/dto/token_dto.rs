use crate::entity::role::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims of an access token, minus the `iat`/`exp` pair the signer adds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenPayload {
    pub sub: Uuid,
    pub token_type: TokenType,
    pub email: String,
    pub role: UserRole,
}

impl AccessTokenPayload {
    pub fn new(sub: Uuid, email: String, role: UserRole) -> Self {
        Self {
            sub,
            token_type: TokenType::Access,
            email,
            role,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenPayload {
    pub sub: Uuid,
    pub token_type: TokenType,
    /// Fresh per token
    pub jti: Uuid,
}

impl RefreshTokenPayload {
    pub fn new(sub: Uuid) -> Self {
        Self {
            sub,
            token_type: TokenType::Refresh,
            jti: Uuid::new_v4(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
}
