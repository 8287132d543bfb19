use crate::domain::models::{event::LifecycleEvent, session::ClassSession};
use crate::domain::ports::SessionRepository;
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

pub struct SqliteSessionRepo {
    pool: SqlitePool,
}

impl SqliteSessionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert_session<'e, E>(executor: E, s: &ClassSession) -> Result<ClassSession, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ClassSession>(
        "INSERT INTO class_sessions (
            id, teacher_id, student_id, school_id, participants_json, date,
            start_time, end_time, duration_minutes, kind, status, max_participants,
            metadata_json, template_id, created_by, created_at,
            confirmed_at, confirmed_by, cancelled_at, cancelled_by, cancellation_reason,
            completed_at, completed_by, actual_duration_minutes, completion_notes,
            rejected_at, rejected_by, no_show_at, no_show_by, no_show_type, no_show_reason
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(&s.id)
    .bind(&s.teacher_id)
    .bind(&s.student_id)
    .bind(&s.school_id)
    .bind(&s.participants_json)
    .bind(s.date)
    .bind(s.start_time)
    .bind(s.end_time)
    .bind(s.duration_minutes)
    .bind(s.kind)
    .bind(s.status)
    .bind(s.max_participants)
    .bind(&s.metadata_json)
    .bind(&s.template_id)
    .bind(&s.created_by)
    .bind(s.created_at)
    .bind(s.confirmed_at)
    .bind(&s.confirmed_by)
    .bind(s.cancelled_at)
    .bind(&s.cancelled_by)
    .bind(&s.cancellation_reason)
    .bind(s.completed_at)
    .bind(&s.completed_by)
    .bind(s.actual_duration_minutes)
    .bind(&s.completion_notes)
    .bind(s.rejected_at)
    .bind(&s.rejected_by)
    .bind(s.no_show_at)
    .bind(&s.no_show_by)
    .bind(s.no_show_type)
    .bind(&s.no_show_reason)
    .fetch_one(executor)
    .await
}

async fn update_session<'e, E>(executor: E, s: &ClassSession) -> Result<ClassSession, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ClassSession>(
        "UPDATE class_sessions SET
            participants_json = ?, date = ?, start_time = ?, end_time = ?,
            duration_minutes = ?, status = ?, metadata_json = ?,
            confirmed_at = ?, confirmed_by = ?,
            cancelled_at = ?, cancelled_by = ?, cancellation_reason = ?,
            completed_at = ?, completed_by = ?, actual_duration_minutes = ?, completion_notes = ?,
            rejected_at = ?, rejected_by = ?,
            no_show_at = ?, no_show_by = ?, no_show_type = ?, no_show_reason = ?
         WHERE id = ?
         RETURNING *",
    )
    .bind(&s.participants_json)
    .bind(s.date)
    .bind(s.start_time)
    .bind(s.end_time)
    .bind(s.duration_minutes)
    .bind(s.status)
    .bind(&s.metadata_json)
    .bind(s.confirmed_at)
    .bind(&s.confirmed_by)
    .bind(s.cancelled_at)
    .bind(&s.cancelled_by)
    .bind(&s.cancellation_reason)
    .bind(s.completed_at)
    .bind(&s.completed_by)
    .bind(s.actual_duration_minutes)
    .bind(&s.completion_notes)
    .bind(s.rejected_at)
    .bind(&s.rejected_by)
    .bind(s.no_show_at)
    .bind(&s.no_show_by)
    .bind(s.no_show_type)
    .bind(&s.no_show_reason)
    .bind(&s.id)
    .fetch_one(executor)
    .await
}

async fn insert_event(
    tx: &mut Transaction<'_, Sqlite>,
    event: &LifecycleEvent,
) -> Result<(), EngineError> {
    sqlx::query(
        "INSERT INTO lifecycle_events (id, school_id, session_id, old_status, new_status, actor_id, occurred_at, participants_json, dispatched, dispatched_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.id)
    .bind(&event.school_id)
    .bind(&event.session_id)
    .bind(event.old_status)
    .bind(event.new_status)
    .bind(&event.actor_id)
    .bind(event.occurred_at)
    .bind(&event.participants_json)
    .bind(event.dispatched)
    .bind(event.dispatched_at)
    .execute(&mut **tx)
    .await
    .map_err(EngineError::Database)?;
    Ok(())
}

// 2067 = SQLite extended unique-constraint violation. On the active-slot
// index it means another booking committed the same slot first.
fn map_insert_error(e: sqlx::Error, session: &ClassSession) -> EngineError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.code().unwrap_or_default() == "2067"
    {
        return EngineError::ConcurrencyConflict(format!(
            "Slot {} {} for teacher {} was booked concurrently",
            session.date, session.start_time, session.teacher_id
        ));
    }
    EngineError::Database(e)
}

#[async_trait]
impl SessionRepository for SqliteSessionRepo {
    async fn create_with_event(
        &self,
        session: &ClassSession,
        event: &LifecycleEvent,
    ) -> Result<ClassSession, EngineError> {
        let mut tx = self.pool.begin().await.map_err(EngineError::Database)?;
        let created = insert_session(&mut *tx, session)
            .await
            .map_err(|e| map_insert_error(e, session))?;
        insert_event(&mut tx, event).await?;
        tx.commit().await.map_err(EngineError::Database)?;
        Ok(created)
    }

    async fn update_with_event(
        &self,
        session: &ClassSession,
        event: &LifecycleEvent,
    ) -> Result<ClassSession, EngineError> {
        let mut tx = self.pool.begin().await.map_err(EngineError::Database)?;
        let updated = update_session(&mut *tx, session)
            .await
            .map_err(EngineError::Database)?;
        insert_event(&mut tx, event).await?;
        tx.commit().await.map_err(EngineError::Database)?;
        Ok(updated)
    }

    async fn update(&self, session: &ClassSession) -> Result<ClassSession, EngineError> {
        update_session(&self.pool, session)
            .await
            .map_err(EngineError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ClassSession>, EngineError> {
        sqlx::query_as::<_, ClassSession>("SELECT * FROM class_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(EngineError::Database)
    }

    async fn list_for_teacher(
        &self,
        teacher_id: &str,
        school_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClassSession>, EngineError> {
        sqlx::query_as::<_, ClassSession>(
            "SELECT * FROM class_sessions
             WHERE teacher_id = ? AND school_id = ? AND date BETWEEN ? AND ?
               AND status IN ('scheduled', 'confirmed')
             ORDER BY date, start_time",
        )
        .bind(teacher_id)
        .bind(school_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn list_for_student_in_school(
        &self,
        student_id: &str,
        school_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClassSession>, EngineError> {
        sqlx::query_as::<_, ClassSession>(
            "SELECT * FROM class_sessions
             WHERE school_id = ? AND date BETWEEN ? AND ?
               AND status IN ('scheduled', 'confirmed')
               AND (student_id = ? OR instr(participants_json, '\"' || ? || '\"') > 0)
             ORDER BY date, start_time",
        )
        .bind(school_id)
        .bind(start)
        .bind(end)
        .bind(student_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn list_for_student_all_schools(
        &self,
        student_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClassSession>, EngineError> {
        sqlx::query_as::<_, ClassSession>(
            "SELECT * FROM class_sessions
             WHERE date BETWEEN ? AND ?
               AND status IN ('scheduled', 'confirmed')
               AND (student_id = ? OR instr(participants_json, '\"' || ? || '\"') > 0)
             ORDER BY date, start_time",
        )
        .bind(start)
        .bind(end)
        .bind(student_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn exists_at(
        &self,
        teacher_id: &str,
        student_id: &str,
        school_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<bool, EngineError> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM class_sessions
             WHERE teacher_id = ? AND student_id = ? AND school_id = ? AND date = ? AND start_time = ?",
        )
        .bind(teacher_id)
        .bind(student_id)
        .bind(school_id)
        .bind(date)
        .bind(start_time)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)?;
        Ok(row.get::<i64, _>("count") > 0)
    }
}
