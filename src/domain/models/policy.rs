use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// School-level policy document stored as JSON on the school row.
/// Every field is optional; absent fields fall through to the next level
/// of the resolution chain.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SchoolPolicySettings {
    pub min_notice_minutes: Option<i64>,
    pub buffer_minutes: Option<i64>,
    pub trial_buffer_minutes: Option<i64>,
    pub group_buffer_minutes: Option<i64>,
    pub teacher_daily_cap: Option<i64>,
    pub teacher_weekly_cap: Option<i64>,
    pub student_daily_cap: Option<i64>,
    pub student_weekly_cap: Option<i64>,
}

/// Per-(teacher, school) overrides. Highest precedence in the chain.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TeacherPolicyOverride {
    pub teacher_id: String,
    pub school_id: String,
    pub min_notice_minutes: Option<i64>,
    pub buffer_minutes: Option<i64>,
    pub daily_cap: Option<i64>,
    pub weekly_cap: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TeacherPolicyOverride {
    pub fn new(teacher_id: String, school_id: String, now: DateTime<Utc>) -> Self {
        Self {
            teacher_id,
            school_id,
            min_notice_minutes: None,
            buffer_minutes: None,
            daily_cap: None,
            weekly_cap: None,
            created_at: now,
        }
    }
}

/// Fully resolved booking policy. Never persisted; produced by
/// `services::policy::resolve` and always populated.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    pub min_notice_minutes: i64,
    pub buffer_minutes: i64,
    pub teacher_daily_cap: i64,
    pub teacher_weekly_cap: i64,
    pub student_daily_cap: i64,
    pub student_weekly_cap: i64,
}
