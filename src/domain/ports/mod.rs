use crate::domain::models::{
    availability::{TeacherAvailability, TeacherUnavailability},
    event::LifecycleEvent,
    member::Role,
    policy::TeacherPolicyOverride,
    school::School,
    session::ClassSession,
    template::RecurringSessionTemplate,
};
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

#[async_trait]
pub trait SchoolRepository: Send + Sync {
    async fn create(&self, school: &School) -> Result<School, EngineError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<School>, EngineError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<School>, EngineError>;
    async fn update(&self, school: &School) -> Result<School, EngineError>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn create_window(
        &self,
        window: &TeacherAvailability,
    ) -> Result<TeacherAvailability, EngineError>;
    async fn update_window(
        &self,
        window: &TeacherAvailability,
    ) -> Result<TeacherAvailability, EngineError>;
    async fn list_windows(
        &self,
        teacher_id: &str,
        school_id: &str,
    ) -> Result<Vec<TeacherAvailability>, EngineError>;
    async fn create_exception(
        &self,
        exception: &TeacherUnavailability,
    ) -> Result<TeacherUnavailability, EngineError>;
    async fn list_exceptions(
        &self,
        teacher_id: &str,
        school_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TeacherUnavailability>, EngineError>;
    async fn find_policy_override(
        &self,
        teacher_id: &str,
        school_id: &str,
    ) -> Result<Option<TeacherPolicyOverride>, EngineError>;
    async fn upsert_policy_override(
        &self,
        over: &TeacherPolicyOverride,
    ) -> Result<TeacherPolicyOverride, EngineError>;
    async fn delete_policy_override(
        &self,
        teacher_id: &str,
        school_id: &str,
    ) -> Result<(), EngineError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert session + creation event in one transaction. A unique-slot
    /// violation surfaces as `EngineError::ConcurrencyConflict`.
    async fn create_with_event(
        &self,
        session: &ClassSession,
        event: &LifecycleEvent,
    ) -> Result<ClassSession, EngineError>;
    /// Persist a status change and its lifecycle event atomically.
    async fn update_with_event(
        &self,
        session: &ClassSession,
        event: &LifecycleEvent,
    ) -> Result<ClassSession, EngineError>;
    async fn update(&self, session: &ClassSession) -> Result<ClassSession, EngineError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ClassSession>, EngineError>;
    /// Active sessions only, inclusive date range.
    async fn list_for_teacher(
        &self,
        teacher_id: &str,
        school_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClassSession>, EngineError>;
    /// Active sessions where the student is primary or a participant.
    async fn list_for_student_in_school(
        &self,
        student_id: &str,
        school_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClassSession>, EngineError>;
    async fn list_for_student_all_schools(
        &self,
        student_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClassSession>, EngineError>;
    /// Duplicate probe for template expansion.
    async fn exists_at(
        &self,
        teacher_id: &str,
        student_id: &str,
        school_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<bool, EngineError>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn create(
        &self,
        template: &RecurringSessionTemplate,
    ) -> Result<RecurringSessionTemplate, EngineError>;
    async fn find_by_id(&self, id: &str)
    -> Result<Option<RecurringSessionTemplate>, EngineError>;
    async fn list_active(
        &self,
        school_id: &str,
    ) -> Result<Vec<RecurringSessionTemplate>, EngineError>;
    async fn update(
        &self,
        template: &RecurringSessionTemplate,
    ) -> Result<RecurringSessionTemplate, EngineError>;
}

#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn find_pending(&self, limit: i32) -> Result<Vec<LifecycleEvent>, EngineError>;
    async fn mark_dispatched(&self, id: &str, at: DateTime<Utc>) -> Result<(), EngineError>;
    async fn list_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<LifecycleEvent>, EngineError>;
}

/// Upstream membership/role collaborator. The engine only reads roles;
/// membership management lives outside this core.
#[async_trait]
pub trait MembershipService: Send + Sync {
    /// Role of an *active* member, `None` for non-members and inactive ones.
    async fn role_of(&self, user_id: &str, school_id: &str)
    -> Result<Option<Role>, EngineError>;
}

/// Downstream notification collaborator fed by the outbox dispatcher.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: &LifecycleEvent) -> Result<(), EngineError>;
}
