use crate::entity::invite::{Invite, InvitePatch, InviteStatus};
use crate::entity::role::UserRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CreateInviteDto {
    #[validate(email(message = "Email format is invalid"))]
    #[validate(length(max = 254, message = "Email must not exceed 254 characters"))]
    pub email: String,
    #[validate(length(max = 100, message = "First name must not exceed 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name must not exceed 100 characters"))]
    pub last_name: Option<String>,
    pub role: UserRole,
    /// Overrides `INVITE_TTL_HOURS` for this invite.
    #[validate(range(min = 1, max = 720, message = "Expiry must be between 1 and 720 hours"))]
    pub expires_in_hours: Option<u32>,
}

/// Body of `PATCH /invites/{id}`. Absent fields are left alone; `null` clears
/// a name. Lifecycle stamps can only be set.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct UpdateInviteDto {
    #[validate(email(message = "Email format is invalid"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100, message = "First name must not exceed 100 characters"))]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100, message = "Last name must not exceed 100 characters"))]
    pub last_name: Option<Option<String>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<UpdateInviteDto> for InvitePatch {
    fn from(dto: UpdateInviteDto) -> Self {
        Self {
            email: dto.email,
            first_name: dto.first_name,
            last_name: dto.last_name,
            expires_at: dto.expires_at,
            used_at: dto.used_at,
            revoked_at: dto.revoked_at,
        }
    }
}

/// Tells a missing field (`None`) apart from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// An empty token is not rejected here; the handler reports it as an unknown
/// invite.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct RedeemInviteDto {
    #[validate(length(max = 512, message = "Token must not exceed 512 characters"))]
    pub token: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InviteTokenQuery {
    pub token: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct InviteReadDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InviteReadDto {
    pub fn at(invite: Invite, now: DateTime<Utc>) -> Self {
        Self {
            status: invite.status_at(now),
            id: invite.id,
            email: invite.email,
            first_name: invite.first_name,
            last_name: invite.last_name,
            role: invite.role,
            expires_at: invite.expires_at,
            used_at: invite.used_at,
            revoked_at: invite.revoked_at,
            created_at: invite.created_at,
        }
    }
}

impl From<Invite> for InviteReadDto {
    fn from(invite: Invite) -> Self {
        Self::at(invite, Utc::now())
    }
}

/// Returned once, on creation. The raw token is not stored anywhere.
#[derive(Clone, Debug, Serialize)]
pub struct IssuedInviteDto {
    pub invite: InviteReadDto,
    pub token: String,
}
