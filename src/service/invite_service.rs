use crate::entity::invite::{Invite, InvitePatch, NewInvite};
use crate::entity::role::UserRole;
use crate::error::invite_error::InviteError;
use crate::repository::invite_repository::InviteRepositoryTrait;
use crate::service::hasher::CredentialHasher;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Raw invite tokens carry 256 bits of entropy.
pub const RAW_TOKEN_BYTES: usize = 32;

/// Owns the invite state machine and is the only writer of `used_at` and
/// `revoked_at`.
///
/// Every "no such valid invite" outcome, including losing a redemption race,
/// surfaces as `InviteError::NotFound`.
#[derive(Clone)]
pub struct InviteService {
    invite_repo: Arc<dyn InviteRepositoryTrait>,
    token_hasher: Arc<dyn CredentialHasher>,
}

impl InviteService {
    pub fn new(invite_repo: Arc<dyn InviteRepositoryTrait>, token_hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            invite_repo,
            token_hasher,
        }
    }

    /// Inserts an invite for an already hashed token. `expires_at` is taken as
    /// given, even if it lies in the past.
    pub async fn create(&self, invite: NewInvite) -> Result<Invite, InviteError> {
        let created = self.invite_repo.insert(invite, Utc::now()).await?;
        info!("Invite {} created for role {}", created.id, created.role);
        Ok(created)
    }

    /// Generates a raw token, stores only its digest and returns the raw token
    /// to the caller. It cannot be recovered afterwards.
    pub async fn issue(
        &self,
        email: String,
        first_name: Option<String>,
        last_name: Option<String>,
        role: UserRole,
        ttl: Duration,
    ) -> Result<(Invite, String), InviteError> {
        let raw_token = generate_raw_token();
        let token = self.token_hasher.hash(&raw_token).await?;
        let expires_at = expiry_after(Utc::now(), ttl)?;

        let invite = self
            .create(NewInvite {
                email,
                first_name,
                last_name,
                role,
                token,
                expires_at,
            })
            .await?;
        Ok((invite, raw_token))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Invite, InviteError> {
        self.invite_repo.find(id).await?.ok_or(InviteError::NotFound)
    }

    pub async fn list_all(&self) -> Result<Vec<Invite>, InviteError> {
        Ok(self.invite_repo.find_all().await?)
    }

    pub async fn update(&self, id: Uuid, patch: &InvitePatch) -> Result<Invite, InviteError> {
        self.invite_repo.update(id, patch).await?.ok_or(InviteError::NotFound)
    }

    /// Stamps `revoked_at` whatever the current state. Repeated calls succeed
    /// and the last one wins.
    pub async fn revoke(&self, id: Uuid) -> Result<Invite, InviteError> {
        let revoked = self
            .invite_repo
            .revoke(id, Utc::now())
            .await?
            .ok_or(InviteError::NotFound)?;
        info!("SECURITY: Invite {} revoked", revoked.id);
        Ok(revoked)
    }

    pub async fn mark_used(&self, id: Uuid) -> Result<Invite, InviteError> {
        self.invite_repo
            .mark_used(id, Utc::now())
            .await?
            .ok_or(InviteError::NotFound)
    }

    pub async fn find_valid_by_token_digest(&self, token_digest: &str) -> Result<Invite, InviteError> {
        self.invite_repo
            .find_valid_by_token(token_digest, Utc::now())
            .await?
            .ok_or(InviteError::NotFound)
    }

    /// Atomically validates and consumes. Of any number of concurrent callers
    /// presenting the same digest, at most one gets the invite back.
    pub async fn consume_by_token_digest(&self, token_digest: &str) -> Result<Invite, InviteError> {
        let consumed = self
            .invite_repo
            .consume_by_token(token_digest, Utc::now())
            .await?
            .ok_or(InviteError::NotFound)?;
        info!("SECURITY: Invite {} consumed", consumed.id);
        Ok(consumed)
    }

    pub async fn find_valid_by_raw_token(&self, raw_token: &str) -> Result<Invite, InviteError> {
        let digest = self.token_hasher.hash(raw_token).await?;
        self.find_valid_by_token_digest(&digest).await
    }

    pub async fn redeem(&self, raw_token: &str) -> Result<Invite, InviteError> {
        let digest = self.token_hasher.hash(raw_token).await?;
        self.consume_by_token_digest(&digest).await
    }
}

fn generate_raw_token() -> String {
    let mut bytes = [0u8; RAW_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, InviteError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| InviteError::InvalidTtl(ttl.num_seconds()))
}
