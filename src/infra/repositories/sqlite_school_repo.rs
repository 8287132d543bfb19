use crate::domain::models::school::School;
use crate::domain::ports::SchoolRepository;
use crate::error::EngineError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteSchoolRepo {
    pool: SqlitePool,
}

impl SqliteSchoolRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchoolRepository for SqliteSchoolRepo {
    async fn create(&self, school: &School) -> Result<School, EngineError> {
        sqlx::query_as::<_, School>(
            "INSERT INTO schools (id, name, slug, timezone, policy_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&school.id)
        .bind(&school.name)
        .bind(&school.slug)
        .bind(&school.timezone)
        .bind(&school.policy_json)
        .bind(school.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<School>, EngineError> {
        sqlx::query_as::<_, School>("SELECT * FROM schools WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(EngineError::Database)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<School>, EngineError> {
        sqlx::query_as::<_, School>("SELECT * FROM schools WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(EngineError::Database)
    }

    async fn update(&self, school: &School) -> Result<School, EngineError> {
        sqlx::query_as::<_, School>(
            "UPDATE schools SET name = ?, timezone = ?, policy_json = ? WHERE id = ? RETURNING *",
        )
        .bind(&school.name)
        .bind(&school.timezone)
        .bind(&school.policy_json)
        .bind(&school.id)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)
    }
}
