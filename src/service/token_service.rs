use crate::error::token_error::TokenError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};

/// Token signing capability.
///
/// Payloads travel as JSON objects so the trait stays object safe. `sign` adds
/// `iat` and `exp`; `verify` checks the signature and `exp` and returns every
/// claim.
#[async_trait]
pub trait TokenSigner: Send + Sync {
    async fn sign(&self, payload: Value, secret: &str, expires_in: Duration) -> Result<String, TokenError>;
    async fn verify(&self, token: &str, secret: &str) -> Result<Map<String, Value>, TokenError>;
}

/// HS256 JWT signer.
#[derive(Clone, Debug)]
pub struct JwtSigner {
    leeway_seconds: u64,
}

impl JwtSigner {
    pub fn new() -> Self {
        Self { leeway_seconds: 30 }
    }

    #[cfg(test)]
    pub fn with_leeway(leeway_seconds: u64) -> Self {
        Self { leeway_seconds }
    }
}

impl Default for JwtSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSigner for JwtSigner {
    async fn sign(&self, payload: Value, secret: &str, expires_in: Duration) -> Result<String, TokenError> {
        let Value::Object(mut claims) = payload else {
            return Err(TokenError::Signing("token payload must be a JSON object".to_string()));
        };

        let now = Utc::now();
        let exp = now
            .checked_add_signed(expires_in)
            .ok_or_else(|| TokenError::Signing("Token expiration calculation overflow".to_string()))?;
        claims.insert("iat".to_string(), Value::from(now.timestamp()));
        claims.insert("exp".to_string(), Value::from(exp.timestamp()));

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    async fn verify(&self, token: &str, secret: &str) -> Result<Map<String, Value>, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = self.leeway_seconds;

        decode::<Map<String, Value>>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                _ => TokenError::InvalidToken(e.to_string()),
            })
    }
}
