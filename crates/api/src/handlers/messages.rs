//! Handlers for the `/messages` resource (chat history).

use axum::extract::State;
use axum::Json;
use relay_core::message::Message;

use crate::state::AppState;

/// GET /messages
///
/// Every stored chat and file message, oldest first.
pub async fn list_messages(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.store.list_messages())
}
