use crate::entity::role::UserRole;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A row of the `invites` relation.
///
/// Validity is never stored: an invite is usable iff it has not been used, has
/// not been revoked and `now < expires_at`. Every query and conditional write
/// recomputes that predicate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Invite {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    /// Digest of the raw token, never the token itself
    #[serde(skip_serializing)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Active,
    Used,
    Revoked,
    Expired,
}

impl Invite {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.revoked_at.is_none() && now < self.expires_at
    }

    /// `used_at` wins when an already-used invite was later revoked.
    pub fn status_at(&self, now: DateTime<Utc>) -> InviteStatus {
        if self.used_at.is_some() {
            InviteStatus::Used
        } else if self.revoked_at.is_some() {
            InviteStatus::Revoked
        } else if now >= self.expires_at {
            InviteStatus::Expired
        } else {
            InviteStatus::Active
        }
    }
}

/// Insert parameters. `id` and `created_at` are assigned by the store.
#[derive(Clone, Debug)]
pub struct NewInvite {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Administrative field patch. `id`, `token`, `created_at` and `role` cannot be
/// changed, and the lifecycle stamps can be set but never cleared.
///
/// Name fields use a nested option: `Some(None)` clears the value.
#[derive(Clone, Debug, Default)]
pub struct InvitePatch {
    pub email: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl InvitePatch {
    pub fn apply(&self, invite: &mut Invite) {
        if let Some(email) = &self.email {
            invite.email = email.clone();
        }
        if let Some(first_name) = &self.first_name {
            invite.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            invite.last_name = last_name.clone();
        }
        if let Some(expires_at) = self.expires_at {
            invite.expires_at = expires_at;
        }
        if let Some(used_at) = self.used_at {
            invite.used_at = Some(used_at);
        }
        if let Some(revoked_at) = self.revoked_at {
            invite.revoked_at = Some(revoked_at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(now: DateTime<Utc>) -> Invite {
        Invite {
            id: Uuid::now_v7(),
            email: "a@b.com".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            role: UserRole::Student,
            token: "digest".to_string(),
            expires_at: now + Duration::hours(1),
            used_at: None,
            revoked_at: None,
            created_at: now,
        }
    }

    #[test]
    fn test_validity_predicate() {
        let now = Utc::now();
        let fresh = invite(now);
        assert!(fresh.is_valid_at(now));
        assert_eq!(fresh.status_at(now), InviteStatus::Active);

        // expires_at is exclusive
        assert!(!fresh.is_valid_at(fresh.expires_at));
        assert_eq!(fresh.status_at(fresh.expires_at), InviteStatus::Expired);

        let mut used = invite(now);
        used.used_at = Some(now);
        assert!(!used.is_valid_at(now));
        assert_eq!(used.status_at(now), InviteStatus::Used);

        let mut revoked = invite(now);
        revoked.revoked_at = Some(now);
        assert!(!revoked.is_valid_at(now));
        assert_eq!(revoked.status_at(now), InviteStatus::Revoked);

        used.revoked_at = Some(now);
        assert_eq!(used.status_at(now), InviteStatus::Used);
    }

    #[test]
    fn test_patch_sets_and_clears_names_but_never_clears_stamps() {
        let now = Utc::now();
        let mut row = invite(now);
        row.used_at = Some(now);

        let patch = InvitePatch {
            email: Some("x@y.com".to_string()),
            first_name: Some(None),
            last_name: Some(Some("Lovelace".to_string())),
            ..InvitePatch::default()
        };
        patch.apply(&mut row);

        assert_eq!(row.email, "x@y.com");
        assert_eq!(row.first_name, None);
        assert_eq!(row.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(row.used_at, Some(now));
        assert_eq!(row.role, UserRole::Student);
    }

    #[test]
    fn test_token_digest_is_not_serialized() {
        let json = serde_json::to_value(invite(Utc::now())).unwrap();
        assert!(json.get("token").is_none());
        assert_eq!(json["role"], "student");
    }
}
