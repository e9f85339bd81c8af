pub mod health;
pub mod jobs;
pub mod messages;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the HTTP route tree.
///
/// ```text
/// /health                 service health
/// /jobs                   list, create
/// /jobs/{id}              get
/// /messages               chat history
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/jobs", jobs::router())
        .nest("/messages", messages::router())
}

/// Build the WebSocket listener's route tree: the upgrade is served at both
/// `/` and `/ws`.
pub fn ws_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ws::ws_handler))
        .route("/ws", get(ws::ws_handler))
}
