use crate::config::database::Database;
use crate::config::logging::secure_log;
use crate::entity::invite::{Invite, InvitePatch, NewInvite};
use crate::error::store_error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const INVITE_COLUMNS: &str =
    "id, email, first_name, last_name, role, token, expires_at, used_at, revoked_at, created_at";

/// Persistence boundary over the `invites` relation.
///
/// Every method that takes `now` evaluates the validity predicate
/// (`used_at IS NULL AND revoked_at IS NULL AND expires_at > now`) inside the
/// store, in the same statement or transaction as the read or write it guards.
#[async_trait]
pub trait InviteRepositoryTrait: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Invite>, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Invite>, StoreError>;
    async fn insert(&self, invite: NewInvite, now: DateTime<Utc>) -> Result<Invite, StoreError>;
    async fn update(&self, id: Uuid, patch: &InvitePatch) -> Result<Option<Invite>, StoreError>;
    /// Unconditional: stamps `revoked_at` even on used or already revoked rows.
    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Invite>, StoreError>;
    /// Compare-and-set of `used_at`; `None` when the row is missing or not valid.
    async fn mark_used(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Invite>, StoreError>;
    async fn find_valid_by_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invite>, StoreError>;
    /// Look up a valid invite by digest and mark it used, as one unit. At most
    /// one concurrent caller gets `Some` for a given invite.
    async fn consume_by_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invite>, StoreError>;
}

#[derive(Clone)]
pub struct InviteRepository {
    db_conn: Arc<Database>,
}

impl InviteRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

fn failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        secure_log::secure_error!(format!("Invite {operation} failed"), e);
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
        {
            return StoreError::Conflict(db.constraint().unwrap_or("invites").to_string());
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl InviteRepositoryTrait for InviteRepository {
    async fn find_all(&self) -> Result<Vec<Invite>, StoreError> {
        let start = Instant::now();
        let invites = sqlx::query_as::<_, Invite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites ORDER BY created_at, id"
        ))
        .fetch_all(self.db_conn.get_pool())
        .await
        .map_err(failed("listing"))?;

        secure_log::sensitive_debug!("Listed {} invites in {:?}", invites.len(), start.elapsed());
        Ok(invites)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Invite>, StoreError> {
        let start = Instant::now();
        let invite = sqlx::query_as::<_, Invite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE id = $1 LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(self.db_conn.get_pool())
        .await
        .map_err(failed("lookup by id"))?;

        secure_log::sensitive_debug!("Invite lookup by id completed in {:?}", start.elapsed());
        Ok(invite)
    }

    async fn insert(&self, invite: NewInvite, now: DateTime<Utc>) -> Result<Invite, StoreError> {
        let start = Instant::now();
        let created = sqlx::query_as::<_, Invite>(&format!(
            r#"
            INSERT INTO invites (id, email, first_name, last_name, role, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&invite.email)
        .bind(&invite.first_name)
        .bind(&invite.last_name)
        .bind(invite.role)
        .bind(&invite.token)
        .bind(invite.expires_at)
        .bind(now)
        .fetch_one(self.db_conn.get_pool())
        .await
        .map_err(failed("insert"))?;

        secure_log::sensitive_debug!("Invite {} inserted in {:?}", created.id, start.elapsed());
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &InvitePatch) -> Result<Option<Invite>, StoreError> {
        let start = Instant::now();
        // Nested options become (should_set, value) pairs so a name can be cleared.
        let updated = sqlx::query_as::<_, Invite>(&format!(
            r#"
            UPDATE invites SET
                email = COALESCE($2, email),
                first_name = CASE WHEN $3 THEN $4 ELSE first_name END,
                last_name = CASE WHEN $5 THEN $6 ELSE last_name END,
                expires_at = COALESCE($7, expires_at),
                used_at = COALESCE($8, used_at),
                revoked_at = COALESCE($9, revoked_at)
            WHERE id = $1
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.email)
        .bind(patch.first_name.is_some())
        .bind(patch.first_name.clone().flatten())
        .bind(patch.last_name.is_some())
        .bind(patch.last_name.clone().flatten())
        .bind(patch.expires_at)
        .bind(patch.used_at)
        .bind(patch.revoked_at)
        .fetch_optional(self.db_conn.get_pool())
        .await
        .map_err(failed("update"))?;

        secure_log::sensitive_debug!("Invite update completed in {:?}", start.elapsed());
        Ok(updated)
    }

    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Invite>, StoreError> {
        let revoked = sqlx::query_as::<_, Invite>(&format!(
            "UPDATE invites SET revoked_at = $2 WHERE id = $1 RETURNING {INVITE_COLUMNS}"
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(self.db_conn.get_pool())
        .await
        .map_err(failed("revoke"))?;

        Ok(revoked)
    }

    async fn mark_used(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Invite>, StoreError> {
        let used = sqlx::query_as::<_, Invite>(&format!(
            r#"
            UPDATE invites SET used_at = $2
            WHERE id = $1 AND used_at IS NULL AND revoked_at IS NULL AND expires_at > $2
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(self.db_conn.get_pool())
        .await
        .map_err(failed("mark used"))?;

        Ok(used)
    }

    async fn find_valid_by_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invite>, StoreError> {
        let start = Instant::now();
        let invite = sqlx::query_as::<_, Invite>(&format!(
            r#"
            SELECT {INVITE_COLUMNS} FROM invites
            WHERE token = $1 AND used_at IS NULL AND revoked_at IS NULL AND expires_at > $2
            LIMIT 1
            "#
        ))
        .bind(token_digest)
        .bind(now)
        .fetch_optional(self.db_conn.get_pool())
        .await
        .map_err(failed("lookup by token"))?;

        secure_log::sensitive_debug!("Invite lookup by token completed in {:?}", start.elapsed());
        Ok(invite)
    }

    async fn consume_by_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invite>, StoreError> {
        let start = Instant::now();
        // Dropping `tx` without commit (error or cancellation) rolls back.
        let mut tx = self
            .db_conn
            .get_pool()
            .begin()
            .await
            .map_err(failed("consume begin"))?;

        let candidate = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM invites
            WHERE token = $1 AND used_at IS NULL AND revoked_at IS NULL AND expires_at > $2
            LIMIT 1
            "#,
        )
        .bind(token_digest)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(failed("consume lookup"))?;

        let Some(id) = candidate else {
            tx.rollback().await.map_err(failed("consume rollback"))?;
            return Ok(None);
        };

        // The predicate is re-checked by the write itself. A concurrent consumer
        // that committed first leaves this statement with zero rows.
        let consumed = sqlx::query_as::<_, Invite>(&format!(
            r#"
            UPDATE invites SET used_at = $2
            WHERE id = $1 AND used_at IS NULL AND revoked_at IS NULL AND expires_at > $2
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(failed("consume update"))?;

        match consumed {
            Some(invite) => {
                tx.commit().await.map_err(failed("consume commit"))?;
                secure_log::sensitive_debug!("Invite {} consumed in {:?}", invite.id, start.elapsed());
                Ok(Some(invite))
            }
            None => {
                tx.rollback().await.map_err(failed("consume rollback"))?;
                Ok(None)
            }
        }
    }
}

/// In-memory store backed by `DashMap`.
///
/// Guarded writes evaluate the validity predicate while holding the row's
/// shard lock, which gives the same at-most-once guarantee as the conditional
/// `UPDATE` of the Postgres store.
#[derive(Default)]
pub struct InMemoryInviteRepository {
    invites: DashMap<Uuid, Invite>,
    by_token: DashMap<String, Uuid>,
}

impl InMemoryInviteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn update_if<F>(&self, id: Uuid, write: F) -> Option<Invite>
    where
        F: FnOnce(&mut Invite) -> bool,
    {
        let mut row = self.invites.get_mut(&id)?;
        write(row.value_mut()).then(|| row.value().clone())
    }
}

#[async_trait]
impl InviteRepositoryTrait for InMemoryInviteRepository {
    async fn find_all(&self) -> Result<Vec<Invite>, StoreError> {
        let mut invites: Vec<Invite> = self.invites.iter().map(|e| e.value().clone()).collect();
        invites.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(invites)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Invite>, StoreError> {
        Ok(self.invites.get(&id).map(|e| e.value().clone()))
    }

    async fn insert(&self, invite: NewInvite, now: DateTime<Utc>) -> Result<Invite, StoreError> {
        let id = Uuid::now_v7();
        match self.by_token.entry(invite.token.clone()) {
            Entry::Occupied(_) => return Err(StoreError::Conflict("invites_token_idx".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let created = Invite {
            id,
            email: invite.email,
            first_name: invite.first_name,
            last_name: invite.last_name,
            role: invite.role,
            token: invite.token,
            expires_at: invite.expires_at,
            used_at: None,
            revoked_at: None,
            created_at: now,
        };
        self.invites.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &InvitePatch) -> Result<Option<Invite>, StoreError> {
        Ok(self.update_if(id, |invite| {
            patch.apply(invite);
            true
        }))
    }

    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Invite>, StoreError> {
        Ok(self.update_if(id, |invite| {
            invite.revoked_at = Some(now);
            true
        }))
    }

    async fn mark_used(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Invite>, StoreError> {
        Ok(self.update_if(id, |invite| {
            if !invite.is_valid_at(now) {
                return false;
            }
            invite.used_at = Some(now);
            true
        }))
    }

    async fn find_valid_by_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invite>, StoreError> {
        let Some(id) = self.by_token.get(token_digest).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self
            .invites
            .get(&id)
            .filter(|e| e.value().is_valid_at(now))
            .map(|e| e.value().clone()))
    }

    async fn consume_by_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invite>, StoreError> {
        let Some(id) = self.by_token.get(token_digest).map(|e| *e.value()) else {
            return Ok(None);
        };
        self.mark_used(id, now).await
    }
}


#[cfg(test)]
mod postgres_tests {
    use super::*;
    use crate::entity::role::UserRole;
    use chrono::Duration;
    use sqlx::PgPool;

    fn repo(pool: PgPool) -> Arc<InviteRepository> {
        Arc::new(InviteRepository::new(&Arc::new(Database::from_pool(pool))))
    }

    fn new_invite(token: &str, expires_at: DateTime<Utc>) -> NewInvite {
        NewInvite {
            email: "a@b.com".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            role: UserRole::Instructor,
            token: token.to_string(),
            expires_at,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_concurrent_consume_has_one_winner(pool: PgPool) {
        let repo = repo(pool);
        let now = Utc::now();
        repo.insert(new_invite("D", now + Duration::hours(1)), now).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.consume_by_token("D", Utc::now()).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(repo.find_valid_by_token("D", Utc::now()).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_revoked_and_expired_rows_cannot_be_consumed(pool: PgPool) {
        let repo = repo(pool);
        let now = Utc::now();

        let revoked = repo.insert(new_invite("R", now + Duration::hours(1)), now).await.unwrap();
        repo.revoke(revoked.id, now).await.unwrap().unwrap();
        assert!(repo.consume_by_token("R", now).await.unwrap().is_none());

        repo.insert(new_invite("E", now - Duration::seconds(1)), now).await.unwrap();
        assert!(repo.find_valid_by_token("E", now).await.unwrap().is_none());
        assert!(repo.consume_by_token("E", now).await.unwrap().is_none());

        assert!(repo.consume_by_token("missing", now).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_sets_and_clears_fields(pool: PgPool) {
        let repo = repo(pool);
        let now = Utc::now();
        let invite = repo.insert(new_invite("D", now + Duration::hours(1)), now).await.unwrap();

        let patch = InvitePatch {
            email: Some("z@z.com".to_string()),
            first_name: Some(None),
            last_name: Some(Some("Lovelace".to_string())),
            ..InvitePatch::default()
        };
        let updated = repo.update(invite.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.email, "z@z.com");
        assert_eq!(updated.first_name, None);
        assert_eq!(updated.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(updated.role, UserRole::Instructor);
        assert!(updated.used_at.is_none());

        // absent fields are left alone
        let untouched = repo.update(invite.id, &InvitePatch::default()).await.unwrap().unwrap();
        assert_eq!(untouched.last_name.as_deref(), Some("Lovelace"));

        let used = InvitePatch {
            used_at: Some(now),
            ..InvitePatch::default()
        };
        repo.update(invite.id, &used).await.unwrap().unwrap();
        assert!(repo.find_valid_by_token("D", now).await.unwrap().is_none());

        assert!(repo.update(Uuid::now_v7(), &patch).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_digest_is_a_conflict(pool: PgPool) {
        let repo = repo(pool);
        let now = Utc::now();
        repo.insert(new_invite("D", now + Duration::hours(1)), now).await.unwrap();

        let err = repo
            .insert(new_invite("D", now + Duration::hours(1)), now)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref constraint) if constraint == "invites_token_idx"));
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_mark_used_is_guarded(pool: PgPool) {
        let repo = repo(pool);
        let now = Utc::now();
        let invite = repo.insert(new_invite("D", now + Duration::hours(1)), now).await.unwrap();

        assert!(repo.mark_used(invite.id, now).await.unwrap().is_some());
        assert!(repo.mark_used(invite.id, now).await.unwrap().is_none());
        assert!(repo.find(invite.id).await.unwrap().unwrap().used_at.is_some());
    }
}
