use crate::config::database::Database;
use crate::config::logging::secure_log;
use crate::entity::user::{NewUser, User, UserStatus};
use crate::error::store_error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, password, role, status, deleted_at, created_at, updated_at";

#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    /// Soft-deleted users are never returned.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn insert(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct UserRepository {
    db_conn: Arc<Database>,
}

impl UserRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let start = std::time::Instant::now();

        match sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(self.db_conn.get_pool())
        .await
        {
            Ok(user) => {
                let _duration = start.elapsed();
                secure_log::sensitive_debug!("User lookup by email completed in {:?}", _duration);
                Ok(user)
            }
            Err(e) => {
                secure_log::secure_error!("User lookup by email failed", e);
                Err(e.into())
            }
        }
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let start = std::time::Instant::now();

        match sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(self.db_conn.get_pool())
        .await
        {
            Ok(user) => {
                let _duration = start.elapsed();
                secure_log::sensitive_debug!("User lookup by ID completed in {:?}", _duration);
                Ok(user)
            }
            Err(e) => {
                secure_log::secure_error!("User lookup by ID failed", e);
                Err(e.into())
            }
        }
    }

    async fn insert(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        match sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password, role, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password)
        .bind(user.role)
        .bind(UserStatus::Active)
        .bind(now)
        .fetch_one(self.db_conn.get_pool())
        .await
        {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict("users_email_key".to_string()))
            }
            Err(e) => {
                secure_log::secure_error!("User insert failed", e);
                Err(e.into())
            }
        }
    }
}

/// In-memory user store keyed by id.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<Uuid, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips status or the soft-delete marker in place.
    #[cfg(test)]
    pub fn modify<F: FnOnce(&mut User)>(&self, id: Uuid, f: F) {
        if let Some(mut user) = self.users.get_mut(&id) {
            f(user.value_mut());
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .map(|u| u.value().clone()))
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn insert(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        let created = User {
            id: Uuid::now_v7(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password: user.password,
            role: user.role,
            status: UserStatus::Active,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::role::UserRole;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            first_name: None,
            last_name: None,
            password: "digest".to_string(),
            role: UserRole::Instructor,
        }
    }

    #[tokio::test]
    async fn test_soft_deleted_users_are_hidden_from_email_lookup() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(new_user("a@b.com"), Utc::now()).await.unwrap();
        assert!(repo.find_by_email("a@b.com").await.unwrap().is_some());

        repo.modify(user.id, |u| u.deleted_at = Some(Utc::now()));

        assert!(repo.find_by_email("a@b.com").await.unwrap().is_none());
        assert!(repo.find(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("a@b.com"), Utc::now()).await.unwrap();
        let err = repo.insert(new_user("a@b.com"), Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
