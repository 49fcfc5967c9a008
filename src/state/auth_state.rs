use crate::config::auth::AuthConfig;
use crate::config::database::Database;
use crate::repository::user_repository::{UserRepository, UserRepositoryTrait};
use crate::service::auth_service::AuthService;
use crate::service::hasher::{Argon2Hasher, CredentialHasher};
use crate::service::token_service::{JwtSigner, TokenSigner};
use std::sync::Arc;

/// Shared by the login route and the bearer guard.
#[derive(Clone)]
pub struct AuthState {
    pub(crate) auth_service: AuthService,
}

impl AuthState {
    pub fn new(db_conn: &Arc<Database>, config: Arc<AuthConfig>) -> Self {
        Self::with_parts(
            Arc::new(UserRepository::new(db_conn)),
            Arc::new(Argon2Hasher::salted()),
            Arc::new(JwtSigner::new()),
            config,
        )
    }

    pub fn with_parts(
        user_repo: Arc<dyn UserRepositoryTrait>,
        hasher: Arc<dyn CredentialHasher>,
        signer: Arc<dyn TokenSigner>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            auth_service: AuthService::new(user_repo, hasher, signer, config),
        }
    }
}
