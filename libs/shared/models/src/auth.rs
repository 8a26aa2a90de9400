use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

/// The three actors the scheduling core distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Practitioner,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "patient" | "user" => Some(Role::Patient),
            "doctor" | "practitioner" => Some(Role::Practitioner),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Practitioner => write!(f, "practitioner"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Verified `(subject, role)` pair handed to the core by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub subject: String,
    pub role: Role,
}

impl Actor {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    pub fn patient(id: Uuid) -> Self {
        Self::new(id.to_string(), Role::Patient)
    }

    pub fn practitioner(id: Uuid) -> Self {
        Self::new(id.to_string(), Role::Practitioner)
    }

    pub fn admin(subject: impl Into<String>) -> Self {
        Self::new(subject, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Subject as a record identity. Admin subjects may be e-mail addresses,
    /// so only patients and practitioners are expected to call this.
    pub fn subject_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.subject).ok()
    }

    /// True when the actor is `role` and its subject is `id`.
    pub fn is(&self, role: Role, id: Uuid) -> bool {
        self.role == role && self.subject_id() == Some(id)
    }
}

impl TryFrom<&User> for Actor {
    type Error = AppError;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        let role = user
            .role
            .as_deref()
            .and_then(Role::parse)
            .ok_or_else(|| AppError::Forbidden("Unrecognised role".to_string()))?;

        Ok(Actor::new(user.id.clone(), role))
    }
}
