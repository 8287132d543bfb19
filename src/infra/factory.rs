use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

use crate::config::Config;
use crate::infra::notify::LoggingNotificationSink;
use crate::infra::repositories::{
    sqlite_availability_repo::SqliteAvailabilityRepo, sqlite_member_repo::SqliteMemberRepo,
    sqlite_outbox_repo::SqliteOutboxRepo, sqlite_school_repo::SqliteSchoolRepo,
    sqlite_session_repo::SqliteSessionRepo, sqlite_template_repo::SqliteTemplateRepo,
};
use crate::state::{BookingLockRegistry, EngineState};

pub async fn bootstrap_state(config: &Config) -> EngineState {
    info!("Initializing SQLite connection with WAL mode...");

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite");

    run_migrations(&pool).await;

    EngineState {
        config: config.clone(),
        school_repo: Arc::new(SqliteSchoolRepo::new(pool.clone())),
        availability_repo: Arc::new(SqliteAvailabilityRepo::new(pool.clone())),
        session_repo: Arc::new(SqliteSessionRepo::new(pool.clone())),
        template_repo: Arc::new(SqliteTemplateRepo::new(pool.clone())),
        outbox_repo: Arc::new(SqliteOutboxRepo::new(pool.clone())),
        membership: Arc::new(SqliteMemberRepo::new(pool.clone())),
        notification_sink: Arc::new(LoggingNotificationSink),
        booking_locks: Arc::new(BookingLockRegistry::default()),
    }
}

pub async fn run_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
