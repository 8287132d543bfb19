use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::config::Config;
use crate::domain::ports::{
    AvailabilityRepository, MembershipService, NotificationSink, OutboxRepository,
    SchoolRepository, SessionRepository, TemplateRepository,
};

/// Hands out one async mutex per (teacher, date) so the conflict check and
/// the session insert run as a single critical section. The unique index on
/// active slots backs this up across processes.
#[derive(Default)]
pub struct BookingLockRegistry {
    locks: Mutex<HashMap<(String, NaiveDate), Arc<tokio::sync::Mutex<()>>>>,
}

impl BookingLockRegistry {
    pub fn lock_for(&self, teacher_id: &str, date: NaiveDate) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("booking lock registry poisoned");
        locks
            .entry((teacher_id.to_string(), date))
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[derive(Clone)]
pub struct EngineState {
    pub config: Config,
    pub school_repo: Arc<dyn SchoolRepository>,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub template_repo: Arc<dyn TemplateRepository>,
    pub outbox_repo: Arc<dyn OutboxRepository>,
    pub membership: Arc<dyn MembershipService>,
    pub notification_sink: Arc<dyn NotificationSink>,
    pub booking_locks: Arc<BookingLockRegistry>,
}

impl EngineState {
    pub fn booking_lock(&self, teacher_id: &str, date: NaiveDate) -> Arc<tokio::sync::Mutex<()>> {
        self.booking_locks.lock_for(teacher_id, date)
    }
}
