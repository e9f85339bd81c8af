use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::ws::hub::ChatHub;

/// Spawn a background task that sends periodic Ping frames to all connected
/// WebSocket clients.
///
/// The task runs until `cancel` is triggered. The returned `JoinHandle` can
/// also be used to abort it explicitly.
pub fn start_heartbeat(
    hub: Arc<ChatHub>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let count = hub.connection_count().await;
                    tracing::debug!(count, "WebSocket heartbeat ping");
                    hub.ping_all().await;
                }
            }
        }
    })
}
