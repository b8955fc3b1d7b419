use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account category a token can be issued for. Patients and doctors have
/// separate account collections; admins skip the two-factor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Patient,
    Doctor,
    Admin,
}

impl UserRole {
    /// Account collection backing this role.
    pub fn collection(&self) -> &'static str {
        match self {
            UserRole::Patient => "patient_users",
            UserRole::Doctor => "doctor_users",
            UserRole::Admin => "admins",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Patient => write!(f, "patient"),
            UserRole::Doctor => write!(f, "doctor"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub role: UserRole,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
}

/// Authenticated principal injected into request extensions by the auth
/// middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub role: UserRole,
    pub issued_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_doctor(&self) -> bool {
        self.role == UserRole::Doctor
    }
}
