use crate::domain::models::member::{Member, Role};
use crate::domain::ports::MembershipService;
use crate::error::EngineError;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Reference implementation of the membership collaborator. Real
/// deployments point the port at the platform's user service instead.
pub struct SqliteMemberRepo {
    pool: SqlitePool,
}

impl SqliteMemberRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, member: &Member) -> Result<Member, EngineError> {
        sqlx::query_as::<_, Member>(
            "INSERT INTO members (user_id, school_id, role, active, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (user_id, school_id) DO UPDATE SET
                role = excluded.role,
                active = excluded.active
             RETURNING *",
        )
        .bind(&member.user_id)
        .bind(&member.school_id)
        .bind(member.role)
        .bind(member.active)
        .bind(member.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(EngineError::Database)
    }
}

#[async_trait]
impl MembershipService for SqliteMemberRepo {
    async fn role_of(
        &self,
        user_id: &str,
        school_id: &str,
    ) -> Result<Option<Role>, EngineError> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT * FROM members WHERE user_id = ? AND school_id = ? AND active = 1",
        )
        .bind(user_id)
        .bind(school_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(EngineError::Database)?;
        Ok(member.map(|m| m.role))
    }
}
