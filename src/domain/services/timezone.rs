use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::domain::models::school::School;
use crate::domain::models::session::ClassSession;
use crate::error::EngineError;

/// The school's configured timezone; invalid or unset names fall back to UTC.
pub fn school_tz(school: &School) -> Tz {
    school.timezone.parse().unwrap_or(chrono_tz::UTC)
}

/// Localizes (date, time) in `tz` and converts to UTC. Local times that are
/// ambiguous or skipped by a DST transition are rejected as invalid input.
pub fn to_utc_instant(
    tz: Tz,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<DateTime<Utc>, EngineError> {
    tz.from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            EngineError::Validation(format!(
                "Local time {date} {time} is ambiguous or skipped in timezone {tz}"
            ))
        })
}

pub fn is_past(instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    instant < now
}

/// The session's authoritative start as a UTC instant, interpreting its
/// stored wall-clock time in the school's timezone.
pub fn session_start_utc(
    school: &School,
    session: &ClassSession,
) -> Result<DateTime<Utc>, EngineError> {
    to_utc_instant(school_tz(school), session.date, session.start_time)
}

pub fn session_is_past(
    school: &School,
    session: &ClassSession,
    now: DateTime<Utc>,
) -> Result<bool, EngineError> {
    Ok(is_past(session_start_utc(school, session)?, now))
}

/// True while the cancellation deadline (`hours_before` the session start)
/// has not yet passed.
pub fn can_cancel_within_deadline(
    start: DateTime<Utc>,
    hours_before: i64,
    now: DateTime<Utc>,
) -> bool {
    now <= start - Duration::hours(hours_before)
}

/// UTC bounds of a school-local calendar day, for day-window queries.
pub fn local_day_bounds(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = tz
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
    (start, start + Duration::days(1))
}
