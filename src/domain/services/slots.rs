use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::models::session::ClassKind;
use crate::domain::services::availability::windows_for_date;
use crate::domain::services::conflict::{Candidate, ConflictContext, detect};
use crate::domain::services::policy::resolve;
use crate::domain::services::timezone::{school_tz, to_utc_instant};
use crate::error::EngineError;
use crate::state::EngineState;

/// An open, bookable window of the requested duration. Carries both the
/// school-local wall clock and the UTC-normalized instants.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Slot {
    pub date: NaiveDate,
    pub start_local: NaiveTime,
    pub end_local: NaiveTime,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

pub struct SlotQuery {
    pub teacher_id: String,
    pub school_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub duration_minutes: i64,
    pub kind: Option<ClassKind>,
}

/// Enumerates open slots for a date range. Candidate slots walk each
/// availability window in fixed steps of the requested duration; partial
/// remainders at the window tail are discarded. Slots failing minimum
/// notice, colliding with existing sessions (buffer-aware) or landing on a
/// capped date are dropped.
pub async fn compute_slots(
    state: &EngineState,
    query: &SlotQuery,
    now: DateTime<Utc>,
) -> Result<Vec<Slot>, EngineError> {
    if query.duration_minutes <= 0 {
        return Err(EngineError::Validation(
            "Slot duration must be positive".to_string(),
        ));
    }
    if query.from > query.to {
        return Err(EngineError::Validation(
            "Date range start must not be after its end".to_string(),
        ));
    }

    let school = state
        .school_repo
        .find_by_id(&query.school_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("School {} not found", query.school_id)))?;
    let tz = school_tz(&school);

    let teacher_override = state
        .availability_repo
        .find_policy_override(&query.teacher_id, &query.school_id)
        .await?;
    let policy = resolve(&school, teacher_override.as_ref(), query.kind);

    // One batch of reads for the whole range: sessions padded a week each
    // way so buffer spill and weekly cap counting see their neighbors.
    let availabilities = state
        .availability_repo
        .list_windows(&query.teacher_id, &query.school_id)
        .await?;
    let exceptions = state
        .availability_repo
        .list_exceptions(&query.teacher_id, &query.school_id, query.from, query.to)
        .await?;
    let sessions = state
        .session_repo
        .list_for_teacher(
            &query.teacher_id,
            &query.school_id,
            query.from - Duration::days(7),
            query.to + Duration::days(7),
        )
        .await?;

    let mut daily_counts: HashMap<NaiveDate, i64> = HashMap::new();
    let mut weekly_counts: HashMap<(i32, u32), i64> = HashMap::new();
    for session in &sessions {
        *daily_counts.entry(session.date).or_default() += 1;
        let week = session.date.iso_week();
        *weekly_counts.entry((week.year(), week.week())).or_default() += 1;
    }

    let notice_cutoff = now + Duration::minutes(policy.min_notice_minutes);
    let mut slots = Vec::new();

    let mut date = query.from;
    while date <= query.to {
        let windows = windows_for_date(&availabilities, &exceptions, date);
        if windows.is_empty() {
            date += Duration::days(1);
            continue;
        }

        if daily_counts.get(&date).copied().unwrap_or(0) >= policy.teacher_daily_cap {
            debug!("Daily cap reached for {}, skipping date", date);
            date += Duration::days(1);
            continue;
        }
        let week = date.iso_week();
        if weekly_counts
            .get(&(week.year(), week.week()))
            .copied()
            .unwrap_or(0)
            >= policy.teacher_weekly_cap
        {
            debug!("Weekly cap reached for week of {}, skipping date", date);
            date += Duration::days(1);
            continue;
        }

        let ctx = ConflictContext {
            teacher_sessions: sessions
                .iter()
                .filter(|s| (s.date - date).num_days().abs() <= 1)
                .cloned()
                .collect(),
            student_same_school: Vec::new(),
            student_all_schools: Vec::new(),
            unavailability: exceptions.iter().filter(|u| u.date == date).cloned().collect(),
            policy,
        };

        for (win_start, win_end) in &windows {
            let win_start_min = (win_start.num_seconds_from_midnight() / 60) as i64;
            let win_end_min = (win_end.num_seconds_from_midnight() / 60) as i64;

            let mut cursor = win_start_min;
            while cursor + query.duration_minutes <= win_end_min {
                let start_local = minute_of_day(cursor);
                let end_local = minute_of_day(cursor + query.duration_minutes);

                let candidate = Candidate {
                    teacher_id: &query.teacher_id,
                    school_id: &query.school_id,
                    student_ids: &[],
                    date,
                    start: start_local,
                    end: end_local,
                    exclude_session_id: None,
                };

                // DST-skipped or ambiguous local times are simply not offered.
                if let Ok(start_utc) = to_utc_instant(tz, date, start_local)
                    && start_utc >= notice_cutoff
                    && detect(&candidate, &ctx).is_none()
                {
                    slots.push(Slot {
                        date,
                        start_local,
                        end_local,
                        start_utc,
                        end_utc: start_utc + Duration::minutes(query.duration_minutes),
                    });
                }

                cursor += query.duration_minutes;
            }
        }

        date += Duration::days(1);
    }

    // Overlapping availability windows can produce the same candidate twice.
    slots.sort_by_key(|s| (s.date, s.start_local));
    slots.dedup_by_key(|s| (s.date, s.start_local));
    Ok(slots)
}

fn minute_of_day(minutes: i64) -> NaiveTime {
    NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)
        .expect("minute offset stays within one day")
}
