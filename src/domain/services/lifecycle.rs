use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::models::event::LifecycleEvent;
use crate::domain::models::member::Actor;
use crate::domain::models::session::{ClassSession, NoShowType, SessionStatus};
use crate::error::EngineError;
use crate::state::EngineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Confirm,
    Cancel,
    Reject,
    Complete,
    NoShow,
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleAction::Confirm => "confirm",
            LifecycleAction::Cancel => "cancel",
            LifecycleAction::Reject => "reject",
            LifecycleAction::Complete => "complete",
            LifecycleAction::NoShow => "no_show",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorClass {
    AssignedTeacher,
    PrimaryStudent,
    SchoolStaff,
}

pub struct TransitionRule {
    pub action: LifecycleAction,
    pub from: &'static [SessionStatus],
    pub to: SessionStatus,
    pub allowed: &'static [ActorClass],
}

/// The whole state machine as data: (action, from-states, target, actors).
pub const TRANSITION_TABLE: &[TransitionRule] = &[
    TransitionRule {
        action: LifecycleAction::Confirm,
        from: &[SessionStatus::Scheduled],
        to: SessionStatus::Confirmed,
        allowed: &[ActorClass::AssignedTeacher, ActorClass::SchoolStaff],
    },
    TransitionRule {
        action: LifecycleAction::Cancel,
        from: &[SessionStatus::Scheduled, SessionStatus::Confirmed],
        to: SessionStatus::Cancelled,
        allowed: &[
            ActorClass::AssignedTeacher,
            ActorClass::PrimaryStudent,
            ActorClass::SchoolStaff,
        ],
    },
    TransitionRule {
        action: LifecycleAction::Reject,
        from: &[SessionStatus::Scheduled],
        to: SessionStatus::Rejected,
        allowed: &[ActorClass::AssignedTeacher, ActorClass::SchoolStaff],
    },
    TransitionRule {
        action: LifecycleAction::Complete,
        from: &[SessionStatus::Confirmed],
        to: SessionStatus::Completed,
        allowed: &[ActorClass::AssignedTeacher, ActorClass::SchoolStaff],
    },
    TransitionRule {
        action: LifecycleAction::NoShow,
        from: &[SessionStatus::Confirmed],
        to: SessionStatus::NoShow,
        allowed: &[ActorClass::AssignedTeacher, ActorClass::SchoolStaff],
    },
];

fn rule_for(action: LifecycleAction) -> &'static TransitionRule {
    TRANSITION_TABLE
        .iter()
        .find(|r| r.action == action)
        .expect("every action has a transition rule")
}

fn actor_matches(class: ActorClass, session: &ClassSession, actor: &Actor) -> bool {
    match class {
        ActorClass::AssignedTeacher => actor.user_id == session.teacher_id,
        ActorClass::PrimaryStudent => actor.user_id == session.student_id,
        ActorClass::SchoolStaff => actor.is_staff(),
    }
}

/// Validates (state, actor) against the table and returns the old status.
/// The session is untouched when this fails.
fn begin_transition(
    session: &ClassSession,
    action: LifecycleAction,
    actor: &Actor,
) -> Result<(SessionStatus, SessionStatus), EngineError> {
    let rule = rule_for(action);

    if !rule.from.contains(&session.status) {
        return Err(EngineError::StateTransition(format!(
            "Cannot {} a session in status {}",
            action, session.status
        )));
    }

    if !rule.allowed.iter().any(|&c| actor_matches(c, session, actor)) {
        return Err(EngineError::StateTransition(format!(
            "Actor {} is not allowed to {} this session",
            actor.user_id, action
        )));
    }

    Ok((session.status, rule.to))
}

pub fn confirm(
    session: &mut ClassSession,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<LifecycleEvent, EngineError> {
    let (old, new) = begin_transition(session, LifecycleAction::Confirm, actor)?;
    session.status = new;
    session.confirmed_at = Some(now);
    session.confirmed_by = Some(actor.user_id.clone());
    Ok(LifecycleEvent::new(session, Some(old), new, actor.user_id.clone(), now))
}

pub fn cancel(
    session: &mut ClassSession,
    actor: &Actor,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<LifecycleEvent, EngineError> {
    let (old, new) = begin_transition(session, LifecycleAction::Cancel, actor)?;
    session.status = new;
    session.cancelled_at = Some(now);
    session.cancelled_by = Some(actor.user_id.clone());
    session.cancellation_reason = reason;
    Ok(LifecycleEvent::new(session, Some(old), new, actor.user_id.clone(), now))
}

/// Teacher-side refusal before confirmation. Unlike `cancel` this leaves
/// the cancellation actor fields untouched.
pub fn reject(
    session: &mut ClassSession,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<LifecycleEvent, EngineError> {
    let (old, new) = begin_transition(session, LifecycleAction::Reject, actor)?;
    session.status = new;
    session.rejected_at = Some(now);
    session.rejected_by = Some(actor.user_id.clone());
    Ok(LifecycleEvent::new(session, Some(old), new, actor.user_id.clone(), now))
}

pub fn complete(
    session: &mut ClassSession,
    actor: &Actor,
    actual_duration_minutes: Option<i64>,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<LifecycleEvent, EngineError> {
    if let Some(minutes) = actual_duration_minutes
        && minutes <= 0
    {
        return Err(EngineError::Validation(
            "Actual duration must be positive".to_string(),
        ));
    }
    let (old, new) = begin_transition(session, LifecycleAction::Complete, actor)?;
    session.status = new;
    session.completed_at = Some(now);
    session.completed_by = Some(actor.user_id.clone());
    session.actual_duration_minutes = actual_duration_minutes;
    session.completion_notes = notes;
    Ok(LifecycleEvent::new(session, Some(old), new, actor.user_id.clone(), now))
}

pub fn mark_no_show(
    session: &mut ClassSession,
    actor: &Actor,
    no_show_type: NoShowType,
    reason: String,
    now: DateTime<Utc>,
) -> Result<LifecycleEvent, EngineError> {
    if reason.trim().is_empty() {
        return Err(EngineError::Validation(
            "A no-show requires a reason".to_string(),
        ));
    }
    let (old, new) = begin_transition(session, LifecycleAction::NoShow, actor)?;
    session.status = new;
    session.no_show_at = Some(now);
    session.no_show_by = Some(actor.user_id.clone());
    session.no_show_type = Some(no_show_type);
    session.no_show_reason = Some(reason);
    Ok(LifecycleEvent::new(session, Some(old), new, actor.user_id.clone(), now))
}

async fn load_session(
    state: &EngineState,
    session_id: &str,
) -> Result<ClassSession, EngineError> {
    state
        .session_repo
        .find_by_id(session_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("Session {session_id} not found")))
}

pub async fn confirm_session(
    state: &EngineState,
    session_id: &str,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<ClassSession, EngineError> {
    let mut session = load_session(state, session_id).await?;
    let event = confirm(&mut session, actor, now)?;
    let updated = state.session_repo.update_with_event(&session, &event).await?;
    info!("Session confirmed: {} by {}", updated.id, actor.user_id);
    Ok(updated)
}

pub async fn cancel_session(
    state: &EngineState,
    session_id: &str,
    actor: &Actor,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<ClassSession, EngineError> {
    let mut session = load_session(state, session_id).await?;
    let event = cancel(&mut session, actor, reason, now)?;
    let updated = state.session_repo.update_with_event(&session, &event).await?;
    info!("Session cancelled: {} by {}", updated.id, actor.user_id);
    Ok(updated)
}

pub async fn reject_session(
    state: &EngineState,
    session_id: &str,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<ClassSession, EngineError> {
    let mut session = load_session(state, session_id).await?;
    let event = reject(&mut session, actor, now)?;
    let updated = state.session_repo.update_with_event(&session, &event).await?;
    info!("Session rejected: {} by {}", updated.id, actor.user_id);
    Ok(updated)
}

pub async fn complete_session(
    state: &EngineState,
    session_id: &str,
    actor: &Actor,
    actual_duration_minutes: Option<i64>,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<ClassSession, EngineError> {
    let mut session = load_session(state, session_id).await?;
    let event = complete(&mut session, actor, actual_duration_minutes, notes, now)?;
    let updated = state.session_repo.update_with_event(&session, &event).await?;
    info!("Session completed: {}", updated.id);
    Ok(updated)
}

pub async fn mark_session_no_show(
    state: &EngineState,
    session_id: &str,
    actor: &Actor,
    no_show_type: NoShowType,
    reason: String,
    now: DateTime<Utc>,
) -> Result<ClassSession, EngineError> {
    let mut session = load_session(state, session_id).await?;
    let event = mark_no_show(&mut session, actor, no_show_type, reason, now)?;
    let updated = state.session_repo.update_with_event(&session, &event).await?;
    info!("Session marked no-show: {}", updated.id);
    Ok(updated)
}
