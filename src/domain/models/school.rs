use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::policy::SchoolPolicySettings;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct School {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// IANA timezone name. Invalid or empty values fall back to UTC.
    pub timezone: String,
    pub policy_json: String,
    pub created_at: DateTime<Utc>,
}

impl School {
    pub fn new(name: String, slug: String, timezone: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            timezone,
            policy_json: "{}".to_string(),
            created_at: now,
        }
    }

    /// Parsed school-level policy settings. Malformed JSON degrades to the
    /// empty document so resolution falls through to system defaults.
    pub fn policy_settings(&self) -> SchoolPolicySettings {
        serde_json::from_str(&self.policy_json).unwrap_or_default()
    }

    pub fn set_policy_settings(&mut self, settings: &SchoolPolicySettings) {
        self.policy_json = serde_json::to_string(settings).unwrap_or_else(|_| "{}".to_string());
    }
}
