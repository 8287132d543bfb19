use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use scheduling_engine::config::Config;
use scheduling_engine::domain::models::availability::{
    TeacherAvailability, TeacherUnavailability,
};
use scheduling_engine::domain::models::member::{Actor, Member, Role};
use scheduling_engine::domain::models::school::School;
use scheduling_engine::domain::ports::{AvailabilityRepository, SchoolRepository};
use scheduling_engine::infra::factory::run_migrations;
use scheduling_engine::infra::notify::LoggingNotificationSink;
use scheduling_engine::infra::repositories::{
    sqlite_availability_repo::SqliteAvailabilityRepo, sqlite_member_repo::SqliteMemberRepo,
    sqlite_outbox_repo::SqliteOutboxRepo, sqlite_school_repo::SqliteSchoolRepo,
    sqlite_session_repo::SqliteSessionRepo, sqlite_template_repo::SqliteTemplateRepo,
};
use scheduling_engine::state::{BookingLockRegistry, EngineState};

#[allow(dead_code)]
pub struct TestEngine {
    pub state: EngineState,
    pub pool: Pool<Sqlite>,
    pub member_repo: SqliteMemberRepo,
    db_filename: String,
}

#[allow(dead_code)]
impl TestEngine {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_migrations(&pool).await;

        let config = Config {
            database_url: db_url.clone(),
            dispatch_interval_secs: 1,
            dispatch_batch_size: 10,
        };

        let state = EngineState {
            config,
            school_repo: Arc::new(SqliteSchoolRepo::new(pool.clone())),
            availability_repo: Arc::new(SqliteAvailabilityRepo::new(pool.clone())),
            session_repo: Arc::new(SqliteSessionRepo::new(pool.clone())),
            template_repo: Arc::new(SqliteTemplateRepo::new(pool.clone())),
            outbox_repo: Arc::new(SqliteOutboxRepo::new(pool.clone())),
            membership: Arc::new(SqliteMemberRepo::new(pool.clone())),
            notification_sink: Arc::new(LoggingNotificationSink),
            booking_locks: Arc::new(BookingLockRegistry::default()),
        };

        Self {
            state,
            member_repo: SqliteMemberRepo::new(pool.clone()),
            pool,
            db_filename,
        }
    }

    pub async fn create_school(&self, timezone: &str) -> School {
        let school = School::new(
            "Test School".to_string(),
            format!("school-{}", Uuid::new_v4()),
            timezone.to_string(),
            now(),
        );
        self.state.school_repo.create(&school).await.unwrap()
    }

    pub async fn add_member(&self, user_id: &str, school_id: &str, role: Role) {
        let member = Member::new(user_id.to_string(), school_id.to_string(), role, now());
        self.member_repo.upsert(&member).await.unwrap();
    }

    /// Seeds an active teacher member plus one weekly availability window.
    pub async fn add_teacher_with_window(
        &self,
        teacher_id: &str,
        school_id: &str,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) {
        self.add_member(teacher_id, school_id, Role::Teacher).await;
        let window = TeacherAvailability::new(
            teacher_id.to_string(),
            school_id.to_string(),
            weekday,
            start,
            end,
            now(),
        );
        self.state
            .availability_repo
            .create_window(&window)
            .await
            .unwrap();
    }

    pub async fn add_all_day_exception(&self, teacher_id: &str, school_id: &str, date: NaiveDate) {
        let exception = TeacherUnavailability::all_day(
            teacher_id.to_string(),
            school_id.to_string(),
            date,
            Some("time off".to_string()),
            now(),
        );
        self.state
            .availability_repo
            .create_exception(&exception)
            .await
            .unwrap();
    }
}

impl Drop for TestEngine {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}

/// Fixed test clock: Tuesday 2030-01-01 00:00 UTC. Every time-sensitive
/// engine operation takes `now` explicitly, so tests never touch the real
/// clock.
#[allow(dead_code)]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

/// The Monday after the fixed clock.
#[allow(dead_code)]
pub fn next_monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
}

#[allow(dead_code)]
pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[allow(dead_code)]
pub fn teacher_actor(id: &str) -> Actor {
    Actor::new(id, Role::Teacher)
}

#[allow(dead_code)]
pub fn student_actor(id: &str) -> Actor {
    Actor::new(id, Role::Student)
}

#[allow(dead_code)]
pub fn admin_actor(id: &str) -> Actor {
    Actor::new(id, Role::Admin)
}
