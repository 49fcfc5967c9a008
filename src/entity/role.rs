use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of roles shared by users and invites. Maps onto the Postgres
/// `user_role` enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Hr,
    Instructor,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Hr => "hr",
            UserRole::Instructor => "instructor",
            UserRole::Student => "student",
        }
    }

    /// Roles allowed to manage invites.
    pub fn can_manage_invites(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Hr)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Instructor).unwrap(), "\"instructor\"");
        let role: UserRole = serde_json::from_str("\"hr\"").unwrap();
        assert_eq!(role, UserRole::Hr);
        assert!(serde_json::from_str::<UserRole>("\"HR\"").is_err());
    }

    #[test]
    fn test_invite_managers() {
        assert!(UserRole::Admin.can_manage_invites());
        assert!(UserRole::Hr.can_manage_invites());
        assert!(!UserRole::Instructor.can_manage_invites());
        assert!(!UserRole::Student.can_manage_invites());
    }
}
