use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Teacher,
    Student,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Member {
    pub user_id: String,
    pub school_id: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(user_id: String, school_id: String, role: Role, now: DateTime<Utc>) -> Self {
        Self { user_id, school_id, role, active: true, created_at: now }
    }
}

/// A pre-authorized caller. The request layer resolves membership before
/// invoking the engine; the engine only checks transition eligibility.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }

    /// School staff may drive every lifecycle transition.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Owner | Role::Admin)
    }
}
