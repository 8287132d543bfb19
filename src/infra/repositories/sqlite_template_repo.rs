use crate::domain::models::template::RecurringSessionTemplate;
use crate::domain::ports::TemplateRepository;
use crate::error::EngineError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteTemplateRepo {
    pool: SqlitePool,
}

impl SqliteTemplateRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for SqliteTemplateRepo {
    async fn create(
        &self,
        template: &RecurringSessionTemplate,
    ) -> Result<RecurringSessionTemplate, EngineError> {
        sqlx::query_as::<_, RecurringSessionTemplate>(
            "INSERT INTO recurring_templates (id, teacher_id, student_id, school_id, day_of_week, start_time, end_time, duration_minutes, kind, start_date, end_date, active, created_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&template.id)
        .bind(&template.teacher_id)
        .bind(&template.student_id)
        .bind(&template.school_id)
        .bind(template.day_of_week)
        .bind(template.start_time)
        .bind(template.end_time)
        .bind(template.duration_minutes)
        .bind(template.kind)
        .bind(template.start_date)
        .bind(template.end_date)
        .bind(template.active)
        .bind(&template.created_by)
        .bind(template.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn find_by_id(
        &self,
        id: &str,
    ) -> Result<Option<RecurringSessionTemplate>, EngineError> {
        sqlx::query_as::<_, RecurringSessionTemplate>(
            "SELECT * FROM recurring_templates WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn list_active(
        &self,
        school_id: &str,
    ) -> Result<Vec<RecurringSessionTemplate>, EngineError> {
        sqlx::query_as::<_, RecurringSessionTemplate>(
            "SELECT * FROM recurring_templates WHERE school_id = ? AND active = 1",
        )
        .bind(school_id)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn update(
        &self,
        template: &RecurringSessionTemplate,
    ) -> Result<RecurringSessionTemplate, EngineError> {
        sqlx::query_as::<_, RecurringSessionTemplate>(
            "UPDATE recurring_templates SET day_of_week = ?, start_time = ?, end_time = ?, duration_minutes = ?, start_date = ?, end_date = ?, active = ?
             WHERE id = ?
             RETURNING *",
        )
        .bind(template.day_of_week)
        .bind(template.start_time)
        .bind(template.end_time)
        .bind(template.duration_minutes)
        .bind(template.start_date)
        .bind(template.end_date)
        .bind(template.active)
        .bind(&template.id)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)
    }
}
