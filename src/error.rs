use serde::Serialize;
use thiserror::Error;

use crate::domain::services::conflict::SessionConflict;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Scheduling conflict: {0}")]
    Conflict(SessionConflict),
    #[error("Policy violation: {0}")]
    PolicyViolation(PolicyViolation),
    #[error("Invalid state transition: {0}")]
    StateTransition(String),
    #[error("Concurrent booking conflict: {0}")]
    ConcurrencyConflict(String),
}

/// Which resolved policy rule a rejected booking ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRule {
    MinimumNotice,
    TeacherDailyCap,
    TeacherWeeklyCap,
    StudentDailyCap,
    StudentWeeklyCap,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyViolation {
    pub rule: PolicyRule,
    pub limit: i64,
    pub observed: i64,
    pub message: String,
}

impl PolicyViolation {
    pub fn new(rule: PolicyRule, limit: i64, observed: i64, message: impl Into<String>) -> Self {
        Self { rule, limit, observed, message: message.into() }
    }
}

impl std::fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
