use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::session::ClassKind;
use crate::domain::services::intervals::span_minutes;

/// Generator for weekly recurring sessions. Expansion materializes one
/// `ClassSession` per matching date, tagged with the template id.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RecurringSessionTemplate {
    pub id: String,
    pub teacher_id: String,
    pub student_id: String,
    pub school_id: String,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i64,
    pub kind: ClassKind,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewTemplateParams {
    pub teacher_id: String,
    pub student_id: String,
    pub school_id: String,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub kind: ClassKind,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_by: String,
}

impl RecurringSessionTemplate {
    pub fn new(params: NewTemplateParams, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            teacher_id: params.teacher_id,
            student_id: params.student_id,
            school_id: params.school_id,
            day_of_week: params.weekday.num_days_from_monday() as i32,
            start_time: params.start_time,
            end_time: params.end_time,
            duration_minutes: span_minutes(params.start_time, params.end_time),
            kind: params.kind,
            start_date: params.start_date,
            end_date: params.end_date,
            active: true,
            created_by: params.created_by,
            created_at: now,
        }
    }
}
