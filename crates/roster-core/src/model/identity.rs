//! Identity types returned by the login and identity-probe calls

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full directory management
    #[serde(alias = "ADMIN", alias = "Admin")]
    Admin,
    /// Regular employee, limited to their own profile
    #[serde(alias = "EMPLOYEE", alias = "Employee")]
    Employee,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Employee => write!(f, "employee"),
        }
    }
}

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Server-assigned user id
    pub id: String,
    /// Login email
    pub email: String,
    /// Role used by the authorization gate
    pub role: Role,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
        }
    }

    /// Whether this identity carries the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Successful login payload: an opaque token plus the identity it belongs to
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginGrant {
    pub token: String,
    #[serde(rename = "user")]
    pub identity: UserIdentity,
}

impl fmt::Debug for LoginGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginGrant")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accepts_upper_case_wire_values() {
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
        let role: Role = serde_json::from_str("\"employee\"").unwrap();
        assert_eq!(role, Role::Employee);
    }

    #[test]
    fn test_login_grant_debug_hides_token() {
        let grant = LoginGrant {
            token: "secret-token".to_string(),
            identity: UserIdentity::new("1", "a@b.com", Role::Admin),
        };
        let rendered = format!("{:?}", grant);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("a@b.com"));
    }
}
