use crate::domain::models::event::LifecycleEvent;
use crate::domain::ports::NotificationSink;
use crate::error::EngineError;
use async_trait::async_trait;
use tracing::info;

/// Default sink: logs the event and declares it delivered. Deployments
/// swap in an adapter for the real notification/reminder service.
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn deliver(&self, event: &LifecycleEvent) -> Result<(), EngineError> {
        info!(
            "Lifecycle event {}: session {} {} -> {} (actor {})",
            event.id,
            event.session_id,
            event
                .old_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "created".to_string()),
            event.new_status,
            event.actor_id
        );
        Ok(())
    }
}
