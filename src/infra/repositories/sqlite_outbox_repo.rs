use crate::domain::models::event::LifecycleEvent;
use crate::domain::ports::OutboxRepository;
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteOutboxRepo {
    pool: SqlitePool,
}

impl SqliteOutboxRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxRepository for SqliteOutboxRepo {
    async fn find_pending(&self, limit: i32) -> Result<Vec<LifecycleEvent>, EngineError> {
        sqlx::query_as::<_, LifecycleEvent>(
            "SELECT * FROM lifecycle_events WHERE dispatched = 0 ORDER BY occurred_at ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::Database)
    }

    async fn mark_dispatched(&self, id: &str, at: DateTime<Utc>) -> Result<(), EngineError> {
        sqlx::query("UPDATE lifecycle_events SET dispatched = 1, dispatched_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(EngineError::Database)?;
        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<LifecycleEvent>, EngineError> {
        sqlx::query_as::<_, LifecycleEvent>(
            "SELECT * FROM lifecycle_events WHERE session_id = ? ORDER BY occurred_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(EngineError::Database)
    }
}
