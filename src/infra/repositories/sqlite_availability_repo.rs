use crate::domain::models::availability::{TeacherAvailability, TeacherUnavailability};
use crate::domain::models::policy::TeacherPolicyOverride;
use crate::domain::ports::AvailabilityRepository;
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub struct SqliteAvailabilityRepo {
    pool: SqlitePool,
}

impl SqliteAvailabilityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepo {
    async fn create_window(
        &self,
        window: &TeacherAvailability,
    ) -> Result<TeacherAvailability, EngineError> {
        sqlx::query_as::<_, TeacherAvailability>(
            "INSERT INTO teacher_availability (id, teacher_id, school_id, day_of_week, start_time, end_time, active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&window.id)
        .bind(&window.teacher_id)
        .bind(&window.school_id)
        .bind(window.day_of_week)
        .bind(window.start_time)
        .bind(window.end_time)
        .bind(window.active)
        .bind(window.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn update_window(
        &self,
        window: &TeacherAvailability,
    ) -> Result<TeacherAvailability, EngineError> {
        sqlx::query_as::<_, TeacherAvailability>(
            "UPDATE teacher_availability SET day_of_week = ?, start_time = ?, end_time = ?, active = ?
             WHERE id = ?
             RETURNING *",
        )
        .bind(window.day_of_week)
        .bind(window.start_time)
        .bind(window.end_time)
        .bind(window.active)
        .bind(&window.id)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn list_windows(
        &self,
        teacher_id: &str,
        school_id: &str,
    ) -> Result<Vec<TeacherAvailability>, EngineError> {
        sqlx::query_as::<_, TeacherAvailability>(
            "SELECT * FROM teacher_availability
             WHERE teacher_id = ? AND school_id = ?
             ORDER BY day_of_week, start_time",
        )
        .bind(teacher_id)
        .bind(school_id)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn create_exception(
        &self,
        exception: &TeacherUnavailability,
    ) -> Result<TeacherUnavailability, EngineError> {
        sqlx::query_as::<_, TeacherUnavailability>(
            "INSERT INTO teacher_unavailability (id, teacher_id, school_id, date, all_day, start_time, end_time, reason, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&exception.id)
        .bind(&exception.teacher_id)
        .bind(&exception.school_id)
        .bind(exception.date)
        .bind(exception.all_day)
        .bind(exception.start_time)
        .bind(exception.end_time)
        .bind(&exception.reason)
        .bind(exception.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn list_exceptions(
        &self,
        teacher_id: &str,
        school_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TeacherUnavailability>, EngineError> {
        sqlx::query_as::<_, TeacherUnavailability>(
            "SELECT * FROM teacher_unavailability
             WHERE teacher_id = ? AND school_id = ? AND date BETWEEN ? AND ?
             ORDER BY date",
        )
        .bind(teacher_id)
        .bind(school_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn find_policy_override(
        &self,
        teacher_id: &str,
        school_id: &str,
    ) -> Result<Option<TeacherPolicyOverride>, EngineError> {
        sqlx::query_as::<_, TeacherPolicyOverride>(
            "SELECT * FROM teacher_policy_overrides WHERE teacher_id = ? AND school_id = ?",
        )
        .bind(teacher_id)
        .bind(school_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn upsert_policy_override(
        &self,
        over: &TeacherPolicyOverride,
    ) -> Result<TeacherPolicyOverride, EngineError> {
        sqlx::query_as::<_, TeacherPolicyOverride>(
            "INSERT INTO teacher_policy_overrides (teacher_id, school_id, min_notice_minutes, buffer_minutes, daily_cap, weekly_cap, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (teacher_id, school_id) DO UPDATE SET
                min_notice_minutes = excluded.min_notice_minutes,
                buffer_minutes = excluded.buffer_minutes,
                daily_cap = excluded.daily_cap,
                weekly_cap = excluded.weekly_cap
             RETURNING *",
        )
        .bind(&over.teacher_id)
        .bind(&over.school_id)
        .bind(over.min_notice_minutes)
        .bind(over.buffer_minutes)
        .bind(over.daily_cap)
        .bind(over.weekly_cap)
        .bind(over.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn delete_policy_override(
        &self,
        teacher_id: &str,
        school_id: &str,
    ) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM teacher_policy_overrides WHERE teacher_id = ? AND school_id = ?")
            .bind(teacher_id)
            .bind(school_id)
            .execute(&self.pool)
            .await
            .map_err(EngineError::Database)?;
        Ok(())
    }
}
