use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A recurring weekly window in the teacher's school-local wall clock.
/// Multiple (possibly overlapping) windows per weekday are permitted.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TeacherAvailability {
    pub id: String,
    pub teacher_id: String,
    pub school_id: String,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl TeacherAvailability {
    pub fn new(
        teacher_id: String,
        school_id: String,
        weekday: Weekday,
        start_time: NaiveTime,
        end_time: NaiveTime,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            teacher_id,
            school_id,
            day_of_week: weekday.num_days_from_monday() as i32,
            start_time,
            end_time,
            active: true,
            created_at: now,
        }
    }

    pub fn matches_date(&self, date: NaiveDate) -> bool {
        self.day_of_week == date.weekday().num_days_from_monday() as i32
    }
}

/// A date-scoped exception that overrides availability for that date only.
/// When `all_day` is false, `start_time`/`end_time` are required.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TeacherUnavailability {
    pub id: String,
    pub teacher_id: String,
    pub school_id: String,
    pub date: NaiveDate,
    pub all_day: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TeacherUnavailability {
    pub fn all_day(
        teacher_id: String,
        school_id: String,
        date: NaiveDate,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            teacher_id,
            school_id,
            date,
            all_day: true,
            start_time: None,
            end_time: None,
            reason,
            created_at: now,
        }
    }

    pub fn partial(
        teacher_id: String,
        school_id: String,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            teacher_id,
            school_id,
            date,
            all_day: false,
            start_time: Some(start_time),
            end_time: Some(end_time),
            reason,
            created_at: now,
        }
    }
}
