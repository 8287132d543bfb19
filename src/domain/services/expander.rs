use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::info;

use crate::domain::models::event::LifecycleEvent;
use crate::domain::models::session::{ClassSession, NewSessionParams, SessionStatus};
use crate::domain::models::template::RecurringSessionTemplate;
use crate::domain::services::timezone::school_tz;
use crate::error::EngineError;
use crate::state::EngineState;

/// The concrete dates a template covers within the expansion horizon:
/// first matching weekday on or after `start_date` (never before `today`),
/// then weekly steps up to min(today + weeks_ahead, end_date).
pub fn occurrences(
    template: &RecurringSessionTemplate,
    today: NaiveDate,
    weeks_ahead: u32,
) -> Vec<NaiveDate> {
    let mut horizon = today + Duration::weeks(weeks_ahead as i64);
    if let Some(end) = template.end_date {
        horizon = horizon.min(end);
    }

    let from = template.start_date.max(today);
    let offset = (template.day_of_week
        - from.weekday().num_days_from_monday() as i32)
        .rem_euclid(7);
    let mut date = from + Duration::days(offset as i64);

    let mut dates = Vec::new();
    while date <= horizon {
        dates.push(date);
        date += Duration::days(7);
    }
    dates
}

/// Materializes sessions for every occurrence that does not already exist.
/// Re-running with the same inputs creates nothing new.
pub async fn expand(
    state: &EngineState,
    template: &RecurringSessionTemplate,
    now: DateTime<Utc>,
    weeks_ahead: u32,
) -> Result<Vec<ClassSession>, EngineError> {
    if !template.active {
        return Ok(Vec::new());
    }

    let school = state
        .school_repo
        .find_by_id(&template.school_id)
        .await?
        .ok_or_else(|| {
            EngineError::NotFound(format!("School {} not found", template.school_id))
        })?;
    let today = now.with_timezone(&school_tz(&school)).date_naive();

    let mut created = Vec::new();
    for date in occurrences(template, today, weeks_ahead) {
        let exists = state
            .session_repo
            .exists_at(
                &template.teacher_id,
                &template.student_id,
                &template.school_id,
                date,
                template.start_time,
            )
            .await?;
        if exists {
            continue;
        }

        let session = ClassSession::new(
            NewSessionParams {
                teacher_id: template.teacher_id.clone(),
                student_id: template.student_id.clone(),
                school_id: template.school_id.clone(),
                date,
                start_time: template.start_time,
                end_time: template.end_time,
                kind: template.kind,
                max_participants: None,
                metadata: None,
                template_id: Some(template.id.clone()),
                created_by: template.created_by.clone(),
            },
            now,
        );
        let event = LifecycleEvent::new(
            &session,
            None,
            SessionStatus::Scheduled,
            template.created_by.clone(),
            now,
        );

        created.push(state.session_repo.create_with_event(&session, &event).await?);
    }

    info!(
        "Template {} expanded: {} new sessions over {} weeks",
        template.id,
        created.len(),
        weeks_ahead
    );
    Ok(created)
}
