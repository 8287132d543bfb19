use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::session::{ClassSession, SessionStatus};

/// Outbox row produced on every status change (and on creation, with
/// `old_status = None`). The background dispatcher forwards these to the
/// notification collaborator; the engine never delivers anything itself.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct LifecycleEvent {
    pub id: String,
    pub school_id: String,
    pub session_id: String,
    pub old_status: Option<SessionStatus>,
    pub new_status: SessionStatus,
    pub actor_id: String,
    pub occurred_at: DateTime<Utc>,
    /// Snapshot of primary student + additional participants at event time.
    pub participants_json: String,
    pub dispatched: bool,
    pub dispatched_at: Option<DateTime<Utc>>,
}

impl LifecycleEvent {
    pub fn new(
        session: &ClassSession,
        old_status: Option<SessionStatus>,
        new_status: SessionStatus,
        actor_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mut participants = vec![session.student_id.clone()];
        participants.extend(session.participants());

        Self {
            id: Uuid::new_v4().to_string(),
            school_id: session.school_id.clone(),
            session_id: session.id.clone(),
            old_status,
            new_status,
            actor_id,
            occurred_at: now,
            participants_json: serde_json::to_string(&participants)
                .unwrap_or_else(|_| "[]".to_string()),
            dispatched: false,
            dispatched_at: None,
        }
    }

    pub fn participants(&self) -> Vec<String> {
        serde_json::from_str(&self.participants_json).unwrap_or_default()
    }
}
