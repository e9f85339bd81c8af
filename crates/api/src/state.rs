use std::sync::Arc;

use relay_store::Store;

use crate::ws::ChatHub;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Job and message storage shared with the scheduler and the hub.
    pub store: Arc<dyn Store>,
    /// WebSocket broadcast hub.
    pub hub: Arc<ChatHub>,
}
