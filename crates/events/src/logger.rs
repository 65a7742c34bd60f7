//! Structured log sink for domain events.
//!
//! [`EventLogger`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! writes one `tracing` record per event until the bus is dropped.

use tokio::sync::broadcast;

use crate::bus::VaultEvent;

pub struct EventLogger;

impl EventLogger {
    /// Consume events until the channel closes. Returns how many were logged.
    pub async fn run(mut receiver: broadcast::Receiver<VaultEvent>) -> u64 {
        let mut logged = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let details = serde_json::to_string(&event.kind).unwrap_or_default();
                    tracing::info!(
                        event = event.name(),
                        document_id = event.kind.document_id(),
                        actor_id = event.actor_id,
                        %details,
                        "Vault event",
                    );
                    logged += 1;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Event bus closed, event logger shutting down");
                    break;
                }
            }
        }
        logged
    }
}
