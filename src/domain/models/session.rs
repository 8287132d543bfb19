use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::services::intervals::span_minutes;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Individual,
    Group,
    Trial,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    Rejected,
    NoShow,
}

impl SessionStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed
                | SessionStatus::Cancelled
                | SessionStatus::Rejected
                | SessionStatus::NoShow
        )
    }

    /// Active sessions occupy the teacher's calendar for conflict purposes.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Scheduled | SessionStatus::Confirmed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Rejected => "rejected",
            SessionStatus::NoShow => "no_show",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NoShowType {
    Student,
    Teacher,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ClassSession {
    pub id: String,
    pub teacher_id: String,
    pub student_id: String,
    pub school_id: String,
    /// JSON array of additional participant ids (group sessions).
    pub participants_json: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    pub kind: ClassKind,
    pub status: SessionStatus,
    /// Required and > 0 for group sessions, NULL otherwise.
    pub max_participants: Option<i64>,
    pub metadata_json: String,
    /// Set when the session was materialized from a recurring template.
    pub template_id: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub actual_duration_minutes: Option<i64>,
    pub completion_notes: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<String>,
    pub no_show_at: Option<DateTime<Utc>>,
    pub no_show_by: Option<String>,
    pub no_show_type: Option<NoShowType>,
    pub no_show_reason: Option<String>,
}

pub struct NewSessionParams {
    pub teacher_id: String,
    pub student_id: String,
    pub school_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub kind: ClassKind,
    pub max_participants: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub template_id: Option<String>,
    pub created_by: String,
}

impl ClassSession {
    pub fn new(params: NewSessionParams, now: DateTime<Utc>) -> Self {
        let metadata_json = params
            .metadata
            .map(|v| v.to_string())
            .unwrap_or_else(|| "{}".to_string());

        Self {
            id: Uuid::new_v4().to_string(),
            teacher_id: params.teacher_id,
            student_id: params.student_id,
            school_id: params.school_id,
            participants_json: "[]".to_string(),
            date: params.date,
            start_time: params.start_time,
            end_time: params.end_time,
            duration_minutes: span_minutes(params.start_time, params.end_time),
            kind: params.kind,
            status: SessionStatus::Scheduled,
            max_participants: params.max_participants,
            metadata_json,
            template_id: params.template_id,
            created_by: params.created_by,
            created_at: now,
            confirmed_at: None,
            confirmed_by: None,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            completed_at: None,
            completed_by: None,
            actual_duration_minutes: None,
            completion_notes: None,
            rejected_at: None,
            rejected_by: None,
            no_show_at: None,
            no_show_by: None,
            no_show_type: None,
            no_show_reason: None,
        }
    }

    /// Additional participant ids beyond the primary student.
    pub fn participants(&self) -> Vec<String> {
        serde_json::from_str(&self.participants_json).unwrap_or_default()
    }

    pub fn set_participants(&mut self, participants: &[String]) {
        self.participants_json =
            serde_json::to_string(participants).unwrap_or_else(|_| "[]".to_string());
    }

    /// Primary student plus additional participants.
    pub fn participant_count(&self) -> usize {
        1 + self.participants().len()
    }

    pub fn is_at_capacity(&self) -> bool {
        match self.max_participants {
            Some(cap) => self.participant_count() as i64 >= cap,
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn involves_student(&self, student_id: &str) -> bool {
        self.student_id == student_id || self.participants().iter().any(|p| p == student_id)
    }

    pub fn metadata(&self) -> serde_json::Value {
        serde_json::from_str(&self.metadata_json).unwrap_or_else(|_| serde_json::json!({}))
    }
}
