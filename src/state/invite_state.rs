use crate::config::database::Database;
use crate::config::invite::InviteConfig;
use crate::error::config_error::ConfigError;
use crate::repository::invite_repository::{InviteRepository, InviteRepositoryTrait};
use crate::service::hasher::{Argon2Hasher, CredentialHasher};
use crate::service::invite_service::InviteService;
use chrono::Duration;
use std::sync::Arc;

#[derive(Clone)]
pub struct InviteState {
    pub(crate) invite_service: InviteService,
    /// Lifetime of invites created without an explicit expiry
    pub(crate) default_ttl: Duration,
}

impl InviteState {
    pub fn new(db_conn: &Arc<Database>, config: &InviteConfig) -> Result<Self, ConfigError> {
        let token_hasher = Argon2Hasher::with_fixed_salt(&config.token_salt)?;
        Ok(Self::with_parts(
            Arc::new(InviteRepository::new(db_conn)),
            Arc::new(token_hasher),
            config.ttl,
        ))
    }

    pub fn with_parts(
        invite_repo: Arc<dyn InviteRepositoryTrait>,
        token_hasher: Arc<dyn CredentialHasher>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            invite_service: InviteService::new(invite_repo, token_hasher),
            default_ttl,
        }
    }
}
