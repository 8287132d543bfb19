use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{info, warn};

use crate::domain::models::event::LifecycleEvent;
use crate::domain::models::member::{Actor, Role};
use crate::domain::models::policy::BookingPolicy;
use crate::domain::models::school::School;
use crate::domain::models::session::{
    ClassKind, ClassSession, NewSessionParams, SessionStatus,
};
use crate::domain::services::conflict::{Candidate, check_capacity, detect, load_context};
use crate::domain::services::intervals::span_minutes;
use crate::domain::services::policy::resolve;
use crate::domain::services::timezone::{school_tz, to_utc_instant};
use crate::error::{EngineError, PolicyRule, PolicyViolation};
use crate::state::EngineState;

pub struct NewSessionRequest {
    pub teacher_id: String,
    pub student_id: String,
    pub school_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub kind: ClassKind,
    pub max_participants: Option<i64>,
    pub metadata: Option<serde_json::Value>,
}

/// Books a session. Validation, policy and conflict checks all run before
/// any write; the conflict check and the insert share a per-(teacher, date)
/// lock so two racing requests cannot both pass.
pub async fn create_session(
    state: &EngineState,
    req: NewSessionRequest,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<ClassSession, EngineError> {
    validate_times(req.start_time, req.end_time)?;
    validate_group_fields(req.kind, req.max_participants)?;

    let school = find_school(state, &req.school_id).await?;
    let tz = school_tz(&school);

    ensure_member(state, &req.teacher_id, &req.school_id, Some(Role::Teacher)).await?;
    ensure_member(state, &req.student_id, &req.school_id, None).await?;

    let start_utc = to_utc_instant(tz, req.date, req.start_time)?;
    if start_utc < now {
        return Err(EngineError::Validation(
            "Cannot book a session in the past".to_string(),
        ));
    }

    let teacher_override = state
        .availability_repo
        .find_policy_override(&req.teacher_id, &req.school_id)
        .await?;
    let policy = resolve(&school, teacher_override.as_ref(), Some(req.kind));

    let lead_minutes = (start_utc - now).num_minutes();
    if lead_minutes < policy.min_notice_minutes {
        return Err(EngineError::PolicyViolation(PolicyViolation::new(
            PolicyRule::MinimumNotice,
            policy.min_notice_minutes,
            lead_minutes,
            format!(
                "Bookings require {} minutes notice; this one starts in {}",
                policy.min_notice_minutes, lead_minutes
            ),
        )));
    }

    check_booking_caps(state, &req, &policy).await?;

    let students = vec![req.student_id.clone()];

    // Critical section: conflict check and insert must not interleave with
    // another booking for the same teacher and date.
    let lock = state.booking_lock(&req.teacher_id, req.date);
    let _guard = lock.lock().await;

    let ctx = load_context(
        state.session_repo.as_ref(),
        state.availability_repo.as_ref(),
        &req.teacher_id,
        &students,
        &req.school_id,
        req.date,
        policy,
    )
    .await?;

    let candidate = Candidate {
        teacher_id: &req.teacher_id,
        school_id: &req.school_id,
        student_ids: &students,
        date: req.date,
        start: req.start_time,
        end: req.end_time,
        exclude_session_id: None,
    };

    if let Some(conflict) = detect(&candidate, &ctx) {
        warn!("Booking rejected: {}", conflict);
        return Err(EngineError::Conflict(conflict));
    }

    let session = ClassSession::new(
        NewSessionParams {
            teacher_id: req.teacher_id,
            student_id: req.student_id,
            school_id: req.school_id,
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
            kind: req.kind,
            max_participants: req.max_participants,
            metadata: req.metadata,
            template_id: None,
            created_by: actor.user_id.clone(),
        },
        now,
    );
    let event = LifecycleEvent::new(
        &session,
        None,
        SessionStatus::Scheduled,
        actor.user_id.clone(),
        now,
    );

    let created = state.session_repo.create_with_event(&session, &event).await?;
    info!(
        "Session booked: {} teacher {} on {} {}",
        created.id, created.teacher_id, created.date, created.start_time
    );
    Ok(created)
}

/// Moves an active session to a new date/time. The session itself is
/// excluded from conflict checks so moving within its own window works.
pub async fn reschedule_session(
    state: &EngineState,
    session_id: &str,
    new_date: NaiveDate,
    new_start: NaiveTime,
    new_end: NaiveTime,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<ClassSession, EngineError> {
    validate_times(new_start, new_end)?;

    let mut session = find_session(state, session_id).await?;
    if !session.is_active() {
        return Err(EngineError::StateTransition(format!(
            "Cannot reschedule a session in status {}",
            session.status
        )));
    }
    ensure_session_actor(&session, actor)?;

    let school = find_school(state, &session.school_id).await?;
    let tz = school_tz(&school);

    let start_utc = to_utc_instant(tz, new_date, new_start)?;
    if start_utc < now {
        return Err(EngineError::Validation(
            "Cannot reschedule into the past".to_string(),
        ));
    }

    let teacher_override = state
        .availability_repo
        .find_policy_override(&session.teacher_id, &session.school_id)
        .await?;
    let policy = resolve(&school, teacher_override.as_ref(), Some(session.kind));

    let lead_minutes = (start_utc - now).num_minutes();
    if lead_minutes < policy.min_notice_minutes {
        return Err(EngineError::PolicyViolation(PolicyViolation::new(
            PolicyRule::MinimumNotice,
            policy.min_notice_minutes,
            lead_minutes,
            format!(
                "Rescheduling requires {} minutes notice; the new start is in {}",
                policy.min_notice_minutes, lead_minutes
            ),
        )));
    }

    let mut students = vec![session.student_id.clone()];
    students.extend(session.participants());

    let lock = state.booking_lock(&session.teacher_id, new_date);
    let _guard = lock.lock().await;

    let ctx = load_context(
        state.session_repo.as_ref(),
        state.availability_repo.as_ref(),
        &session.teacher_id,
        &students,
        &session.school_id,
        new_date,
        policy,
    )
    .await?;

    let candidate = Candidate {
        teacher_id: &session.teacher_id,
        school_id: &session.school_id,
        student_ids: &students,
        date: new_date,
        start: new_start,
        end: new_end,
        exclude_session_id: Some(&session.id),
    };

    if let Some(conflict) = detect(&candidate, &ctx) {
        warn!("Reschedule rejected: {}", conflict);
        return Err(EngineError::Conflict(conflict));
    }

    session.date = new_date;
    session.start_time = new_start;
    session.end_time = new_end;
    session.duration_minutes = span_minutes(new_start, new_end);

    let updated = state.session_repo.update(&session).await?;
    info!(
        "Session rescheduled: {} to {} {}",
        updated.id, updated.date, updated.start_time
    );
    Ok(updated)
}

/// Adds a student to an existing group session, enforcing double-booking
/// rules and capacity.
pub async fn add_participant(
    state: &EngineState,
    session_id: &str,
    student_id: &str,
    actor: &Actor,
) -> Result<ClassSession, EngineError> {
    let mut session = find_session(state, session_id).await?;

    if session.kind != ClassKind::Group {
        return Err(EngineError::Validation(
            "Participants can only be added to group sessions".to_string(),
        ));
    }
    if !session.is_active() {
        return Err(EngineError::StateTransition(format!(
            "Cannot join a session in status {}",
            session.status
        )));
    }
    if !actor.is_staff() && actor.user_id != session.teacher_id && actor.user_id != student_id {
        return Err(EngineError::StateTransition(format!(
            "Actor {} may not add participants to this session",
            actor.user_id
        )));
    }
    if session.involves_student(student_id) {
        return Err(EngineError::Validation(format!(
            "Student {student_id} is already in this session"
        )));
    }

    ensure_member(state, student_id, &session.school_id, None).await?;

    // Student-side double booking, then capacity; the teacher side is the
    // session itself, so no teacher checks here.
    let students = vec![student_id.to_string()];
    let same_school = state
        .session_repo
        .list_for_student_in_school(student_id, &session.school_id, session.date, session.date)
        .await?;
    let all_schools = state
        .session_repo
        .list_for_student_all_schools(student_id, session.date, session.date)
        .await?;

    let ctx = crate::domain::services::conflict::ConflictContext {
        teacher_sessions: Vec::new(),
        student_same_school: same_school,
        student_all_schools: all_schools,
        unavailability: Vec::new(),
        policy: resolve(&find_school(state, &session.school_id).await?, None, Some(session.kind)),
    };
    let candidate = Candidate {
        teacher_id: &session.teacher_id,
        school_id: &session.school_id,
        student_ids: &students,
        date: session.date,
        start: session.start_time,
        end: session.end_time,
        exclude_session_id: Some(&session.id),
    };
    if let Some(conflict) = detect(&candidate, &ctx) {
        return Err(EngineError::Conflict(conflict));
    }

    if let Some(conflict) = check_capacity(&session) {
        return Err(EngineError::Conflict(conflict));
    }

    let mut participants = session.participants();
    participants.push(student_id.to_string());
    session.set_participants(&participants);

    let updated = state.session_repo.update(&session).await?;
    info!("Participant {} joined session {}", student_id, updated.id);
    Ok(updated)
}

pub async fn remove_participant(
    state: &EngineState,
    session_id: &str,
    student_id: &str,
    actor: &Actor,
) -> Result<ClassSession, EngineError> {
    let mut session = find_session(state, session_id).await?;

    if !actor.is_staff() && actor.user_id != session.teacher_id && actor.user_id != student_id {
        return Err(EngineError::StateTransition(format!(
            "Actor {} may not remove participants from this session",
            actor.user_id
        )));
    }

    let mut participants = session.participants();
    let before = participants.len();
    participants.retain(|p| p != student_id);
    if participants.len() == before {
        return Err(EngineError::NotFound(format!(
            "Student {student_id} is not an additional participant of this session"
        )));
    }
    session.set_participants(&participants);

    let updated = state.session_repo.update(&session).await?;
    info!("Participant {} left session {}", student_id, updated.id);
    Ok(updated)
}

fn validate_times(start: NaiveTime, end: NaiveTime) -> Result<(), EngineError> {
    if start >= end {
        return Err(EngineError::Validation(
            "Session start must be before its end".to_string(),
        ));
    }
    Ok(())
}

fn validate_group_fields(
    kind: ClassKind,
    max_participants: Option<i64>,
) -> Result<(), EngineError> {
    match (kind, max_participants) {
        (ClassKind::Group, None) => Err(EngineError::Validation(
            "Group sessions require max_participants".to_string(),
        )),
        (ClassKind::Group, Some(cap)) if cap <= 0 => Err(EngineError::Validation(
            "max_participants must be positive".to_string(),
        )),
        (ClassKind::Group, Some(_)) => Ok(()),
        (_, Some(_)) => Err(EngineError::Validation(
            "max_participants is only valid for group sessions".to_string(),
        )),
        (_, None) => Ok(()),
    }
}

async fn find_school(state: &EngineState, school_id: &str) -> Result<School, EngineError> {
    state
        .school_repo
        .find_by_id(school_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("School {school_id} not found")))
}

async fn find_session(
    state: &EngineState,
    session_id: &str,
) -> Result<ClassSession, EngineError> {
    state
        .session_repo
        .find_by_id(session_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("Session {session_id} not found")))
}

async fn ensure_member(
    state: &EngineState,
    user_id: &str,
    school_id: &str,
    required_role: Option<Role>,
) -> Result<(), EngineError> {
    let role = state.membership.role_of(user_id, school_id).await?;
    match (role, required_role) {
        (None, _) => Err(EngineError::Validation(format!(
            "User {user_id} is not an active member of school {school_id}"
        ))),
        (Some(found), Some(required)) if found != required => {
            Err(EngineError::Validation(format!(
                "User {user_id} is not a {required:?} in school {school_id}"
            )))
        }
        _ => Ok(()),
    }
}

fn ensure_session_actor(session: &ClassSession, actor: &Actor) -> Result<(), EngineError> {
    if actor.is_staff()
        || actor.user_id == session.teacher_id
        || actor.user_id == session.student_id
    {
        return Ok(());
    }
    Err(EngineError::StateTransition(format!(
        "Actor {} may not modify this session",
        actor.user_id
    )))
}

async fn check_booking_caps(
    state: &EngineState,
    req: &NewSessionRequest,
    policy: &BookingPolicy,
) -> Result<(), EngineError> {
    let week_start = req.date - Duration::days(req.date.weekday().num_days_from_monday() as i64);
    let week_end = week_start + Duration::days(6);

    let teacher_week = state
        .session_repo
        .list_for_teacher(&req.teacher_id, &req.school_id, week_start, week_end)
        .await?;
    let teacher_day = teacher_week.iter().filter(|s| s.date == req.date).count() as i64;
    if teacher_day >= policy.teacher_daily_cap {
        return Err(EngineError::PolicyViolation(PolicyViolation::new(
            PolicyRule::TeacherDailyCap,
            policy.teacher_daily_cap,
            teacher_day,
            format!("Teacher already has {teacher_day} sessions on {}", req.date),
        )));
    }
    if teacher_week.len() as i64 >= policy.teacher_weekly_cap {
        return Err(EngineError::PolicyViolation(PolicyViolation::new(
            PolicyRule::TeacherWeeklyCap,
            policy.teacher_weekly_cap,
            teacher_week.len() as i64,
            format!("Teacher already has {} sessions that week", teacher_week.len()),
        )));
    }

    let student_week = state
        .session_repo
        .list_for_student_in_school(&req.student_id, &req.school_id, week_start, week_end)
        .await?;
    let student_day = student_week.iter().filter(|s| s.date == req.date).count() as i64;
    if student_day >= policy.student_daily_cap {
        return Err(EngineError::PolicyViolation(PolicyViolation::new(
            PolicyRule::StudentDailyCap,
            policy.student_daily_cap,
            student_day,
            format!("Student already has {student_day} sessions on {}", req.date),
        )));
    }
    if student_week.len() as i64 >= policy.student_weekly_cap {
        return Err(EngineError::PolicyViolation(PolicyViolation::new(
            PolicyRule::StudentWeeklyCap,
            policy.student_weekly_cap,
            student_week.len() as i64,
            format!("Student already has {} sessions that week", student_week.len()),
        )));
    }

    Ok(())
}
