use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::domain::models::availability::TeacherUnavailability;
use crate::domain::models::policy::BookingPolicy;
use crate::domain::models::session::ClassSession;
use crate::domain::ports::{AvailabilityRepository, SessionRepository};
use crate::domain::services::intervals::{buffered_overlaps, overlaps};
use crate::error::EngineError;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Unavailability,
    TeacherOverlap,
    TeacherBuffer,
    StudentCrossSchool,
    StudentDoubleBooking,
    GroupCapacity,
}

#[derive(Debug, Serialize, Clone)]
pub struct SessionConflict {
    pub kind: ConflictKind,
    pub message: String,
    /// Colliding session, when the conflict is against one.
    pub session_id: Option<String>,
    pub buffer_minutes: i64,
    /// Earliest instant (local wall clock) at which the slot frees up.
    pub available_from: Option<NaiveDateTime>,
}

impl std::fmt::Display for SessionConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A candidate booking to validate. `student_ids` is empty when browsing
/// slots (no student known yet), otherwise primary + additional students.
pub struct Candidate<'a> {
    pub teacher_id: &'a str,
    pub school_id: &'a str,
    pub student_ids: &'a [String],
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Excluded from all checks, for edit/reschedule flows.
    pub exclude_session_id: Option<&'a str>,
}

/// Everything `detect` needs, prefetched so the check itself is pure and a
/// slot sweep can reuse one batch of queries for a whole date range.
pub struct ConflictContext {
    /// Active sessions for the teacher in the same school, dates padded by
    /// one day each way so buffer spill across midnight is visible.
    pub teacher_sessions: Vec<ClassSession>,
    /// Active sessions involving any candidate student, same school.
    pub student_same_school: Vec<ClassSession>,
    /// Active sessions involving any candidate student, every school.
    pub student_all_schools: Vec<ClassSession>,
    pub unavailability: Vec<TeacherUnavailability>,
    pub policy: BookingPolicy,
}

pub async fn load_context(
    session_repo: &dyn SessionRepository,
    availability_repo: &dyn AvailabilityRepository,
    candidate_teacher: &str,
    candidate_students: &[String],
    school_id: &str,
    date: NaiveDate,
    policy: BookingPolicy,
) -> Result<ConflictContext, EngineError> {
    let pad_start = date - Duration::days(1);
    let pad_end = date + Duration::days(1);

    let teacher_sessions = session_repo
        .list_for_teacher(candidate_teacher, school_id, pad_start, pad_end)
        .await?;

    let mut student_same_school = Vec::new();
    let mut student_all_schools = Vec::new();
    for student_id in candidate_students {
        student_same_school.extend(
            session_repo
                .list_for_student_in_school(student_id, school_id, date, date)
                .await?,
        );
        student_all_schools.extend(
            session_repo
                .list_for_student_all_schools(student_id, date, date)
                .await?,
        );
    }

    let unavailability = availability_repo
        .list_exceptions(candidate_teacher, school_id, date, date)
        .await?;

    Ok(ConflictContext {
        teacher_sessions,
        student_same_school,
        student_all_schools,
        unavailability,
        policy,
    })
}

/// Runs the conflict checks in fixed precedence order and returns the first
/// match: unavailability, then teacher overlap/buffer, then student
/// cross-school, then student same-school. A cross-school hit outranks a
/// same-school one because it blocks the student everywhere. Group capacity
/// is checked separately on the join path (`check_capacity`).
pub fn detect(candidate: &Candidate<'_>, ctx: &ConflictContext) -> Option<SessionConflict> {
    check_unavailability(candidate, &ctx.unavailability)
        .or_else(|| check_teacher_sessions(candidate, &ctx.teacher_sessions, ctx.policy.buffer_minutes))
        .or_else(|| check_student_sessions(candidate, ctx))
}

fn anchor(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> (NaiveDateTime, NaiveDateTime) {
    (date.and_time(start), date.and_time(end))
}

fn check_unavailability(
    candidate: &Candidate<'_>,
    unavailability: &[TeacherUnavailability],
) -> Option<SessionConflict> {
    let (c_start, c_end) = anchor(candidate.date, candidate.start, candidate.end);

    for block in unavailability.iter().filter(|u| u.date == candidate.date) {
        if block.all_day {
            return Some(SessionConflict {
                kind: ConflictKind::Unavailability,
                message: format!(
                    "Teacher is unavailable all day on {}{}",
                    block.date,
                    block
                        .reason
                        .as_deref()
                        .map(|r| format!(" ({r})"))
                        .unwrap_or_default()
                ),
                session_id: None,
                buffer_minutes: 0,
                available_from: None,
            });
        }

        if let (Some(b_start), Some(b_end)) = (block.start_time, block.end_time) {
            let (u_start, u_end) = anchor(block.date, b_start, b_end);
            if overlaps(c_start, c_end, u_start, u_end) {
                return Some(SessionConflict {
                    kind: ConflictKind::Unavailability,
                    message: format!(
                        "Teacher is unavailable {} to {} on {}",
                        b_start, b_end, block.date
                    ),
                    session_id: None,
                    buffer_minutes: 0,
                    available_from: Some(u_end),
                });
            }
        }
    }

    None
}

fn check_teacher_sessions(
    candidate: &Candidate<'_>,
    sessions: &[ClassSession],
    buffer_minutes: i64,
) -> Option<SessionConflict> {
    let (c_start, c_end) = anchor(candidate.date, candidate.start, candidate.end);

    for session in sessions {
        if Some(session.id.as_str()) == candidate.exclude_session_id || !session.is_active() {
            continue;
        }

        let (s_start, s_end) = anchor(session.date, session.start_time, session.end_time);
        let free_at = s_end + Duration::minutes(buffer_minutes);

        if overlaps(c_start, c_end, s_start, s_end) {
            return Some(SessionConflict {
                kind: ConflictKind::TeacherOverlap,
                message: format!(
                    "Teacher already has a session {} to {} on {}; slot frees at {} (buffer {} min)",
                    session.start_time, session.end_time, session.date, free_at, buffer_minutes
                ),
                session_id: Some(session.id.clone()),
                buffer_minutes,
                available_from: Some(free_at),
            });
        }

        if buffer_minutes > 0 && buffered_overlaps(c_start, c_end, s_start, s_end, buffer_minutes) {
            return Some(SessionConflict {
                kind: ConflictKind::TeacherBuffer,
                message: format!(
                    "Too close to the session ending {} on {}: {} min buffer required, free from {}",
                    session.end_time, session.date, buffer_minutes, free_at
                ),
                session_id: Some(session.id.clone()),
                buffer_minutes,
                available_from: Some(free_at),
            });
        }
    }

    None
}

fn check_student_sessions(
    candidate: &Candidate<'_>,
    ctx: &ConflictContext,
) -> Option<SessionConflict> {
    if candidate.student_ids.is_empty() {
        return None;
    }

    let (c_start, c_end) = anchor(candidate.date, candidate.start, candidate.end);

    let colliding = |session: &&ClassSession| -> bool {
        if Some(session.id.as_str()) == candidate.exclude_session_id || !session.is_active() {
            return false;
        }
        if !candidate.student_ids.iter().any(|s| session.involves_student(s)) {
            return false;
        }
        let (s_start, s_end) = anchor(session.date, session.start_time, session.end_time);
        overlaps(c_start, c_end, s_start, s_end)
    };

    // Cross-school first: it blocks the student everywhere, so it wins the
    // error report even when a same-school collision also exists.
    if let Some(session) = ctx
        .student_all_schools
        .iter()
        .filter(|s| s.school_id != candidate.school_id)
        .find(colliding)
    {
        return Some(SessionConflict {
            kind: ConflictKind::StudentCrossSchool,
            message: format!(
                "Student already has a session {} to {} on {} at another school",
                session.start_time, session.end_time, session.date
            ),
            session_id: Some(session.id.clone()),
            buffer_minutes: 0,
            available_from: Some(session.date.and_time(session.end_time)),
        });
    }

    if let Some(session) = ctx.student_same_school.iter().find(colliding) {
        return Some(SessionConflict {
            kind: ConflictKind::StudentDoubleBooking,
            message: format!(
                "Student already has a session {} to {} on {}",
                session.start_time, session.end_time, session.date
            ),
            session_id: Some(session.id.clone()),
            buffer_minutes: 0,
            available_from: Some(session.date.and_time(session.end_time)),
        });
    }

    None
}

/// Capacity check for joining an existing group session.
pub fn check_capacity(session: &ClassSession) -> Option<SessionConflict> {
    if session.is_at_capacity() {
        return Some(SessionConflict {
            kind: ConflictKind::GroupCapacity,
            message: format!(
                "Session {} is full ({} of {} participants)",
                session.id,
                session.participant_count(),
                session.max_participants.unwrap_or(0)
            ),
            session_id: Some(session.id.clone()),
            buffer_minutes: 0,
            available_from: None,
        });
    }
    None
}
