use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{Instrument, error, info, info_span};

use crate::state::EngineState;

/// Drains the lifecycle-event outbox and forwards each event to the
/// notification collaborator. Failed deliveries stay pending and are
/// retried on the next round; delivery semantics past the sink are the
/// collaborator's responsibility.
pub async fn start_outbox_dispatcher(state: Arc<EngineState>) {
    info!("Starting lifecycle event dispatcher...");

    loop {
        match state.outbox_repo.find_pending(state.config.dispatch_batch_size).await {
            Ok(events) => {
                for event in events {
                    let span = info_span!(
                        "lifecycle_dispatch",
                        event_id = %event.id,
                        session_id = %event.session_id,
                        school_id = %event.school_id
                    );

                    async {
                        match state.notification_sink.deliver(&event).await {
                            Ok(()) => {
                                if let Err(e) = state
                                    .outbox_repo
                                    .mark_dispatched(&event.id, Utc::now())
                                    .await
                                {
                                    error!("Failed to mark event as dispatched: {:?}", e);
                                }
                            }
                            Err(e) => {
                                error!("Event delivery failed, leaving pending: {:?}", e);
                            }
                        }
                    }
                    .instrument(span)
                    .await;
                }
            }
            Err(e) => error!("Failed to fetch pending lifecycle events: {:?}", e),
        }
        sleep(Duration::from_secs(state.config.dispatch_interval_secs)).await;
    }
}
