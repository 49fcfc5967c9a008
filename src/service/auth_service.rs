use crate::config::auth::AuthConfig;
use crate::config::logging::secure_log;
use crate::dto::token_dto::{AccessTokenPayload, RefreshTokenPayload, TokenPairDto, TokenType};
use crate::error::auth_error::AuthError;
use crate::error::token_error::TokenError;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::hasher::{CredentialHasher, DECOY_DIGEST};
use crate::service::token_service::TokenSigner;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Password login and access/refresh token minting. Never writes to storage.
#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    hasher: Arc<dyn CredentialHasher>,
    signer: Arc<dyn TokenSigner>,
    config: Arc<AuthConfig>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        hasher: Arc<dyn CredentialHasher>,
        signer: Arc<dyn TokenSigner>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            hasher,
            signer,
            config,
        }
    }

    /// Every credential failure (unknown email, wrong password, disabled
    /// account, unreadable digest) yields the same `InvalidCredentials`, after
    /// exactly one hash verification.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPairDto, AuthError> {
        let user = self.user_repo.find_by_email(email.trim()).await?;

        let Some(user) = user else {
            self.verify_password(DECOY_DIGEST, password).await;
            warn!("SECURITY: Login failed for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(&user.password, password).await {
            warn!("SECURITY: Invalid password attempt for user ID: {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active() {
            warn!("SECURITY: Login rejected for inactive user ID: {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .generate_access_token(&AccessTokenPayload::new(user.id, user.email.clone(), user.role))
            .await?;
        let refresh_token = self
            .generate_refresh_token(&RefreshTokenPayload::new(user.id))
            .await?;

        info!("SECURITY: Successful authentication for user ID: {}", user.id);
        Ok(TokenPairDto {
            access_token,
            refresh_token,
        })
    }

    pub async fn generate_access_token(&self, payload: &AccessTokenPayload) -> Result<String, TokenError> {
        self.sign(payload, &self.config.access_secret, self.config.access_expires_in)
            .await
    }

    pub async fn generate_refresh_token(&self, payload: &RefreshTokenPayload) -> Result<String, TokenError> {
        self.sign(payload, &self.config.refresh_secret, self.config.refresh_expires_in)
            .await
    }

    pub async fn verify_access_token(&self, token: &str) -> Result<AccessTokenPayload, TokenError> {
        let claims = self.signer.verify(token, &self.config.access_secret).await?;

        let token_type = claims.get("token_type").cloned().unwrap_or(Value::Null);
        if serde_json::from_value::<TokenType>(token_type.clone()).ok() != Some(TokenType::Access) {
            return Err(TokenError::WrongTokenType(token_type.to_string()));
        }

        serde_json::from_value(Value::Object(claims)).map_err(|e| TokenError::InvalidToken(e.to_string()))
    }

    async fn sign<P: Serialize>(
        &self,
        payload: &P,
        secret: &str,
        expires_in: chrono::Duration,
    ) -> Result<String, TokenError> {
        let payload = serde_json::to_value(payload).map_err(|e| TokenError::Signing(e.to_string()))?;
        self.signer.sign(payload, secret, expires_in).await
    }

    async fn verify_password(&self, digest: &str, password: &str) -> bool {
        match self.hasher.verify(digest, password).await {
            Ok(matched) => matched,
            Err(e) => {
                secure_log::secure_error!("SECURITY: Password verification system error", e);
                false
            }
        }
    }
}
