use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::Message;
use relay_core::frames::{Envelope, InboundFrame};
use relay_core::message::{Message as ChatMessage, MessageType};
use relay_core::types::Timestamp;
use relay_store::Store;
use tokio::sync::{mpsc, Mutex, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

/// Fans chat and file messages out to every connected peer.
///
/// Thread-safe via interior locks; designed to be wrapped in `Arc` and shared
/// across connection tasks. Peers are anonymous: any connection may post as
/// any `userId`.
pub struct ChatHub {
    store: Arc<dyn Store>,
    connections: RwLock<HashMap<String, WsConnection>>,
    /// Held while a message is stamped, stored and fanned out, so every peer
    /// sees messages in store order.
    fan_out: Mutex<()>,
}

impl ChatHub {
    /// Create a hub with no connections that persists into `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            connections: RwLock::new(HashMap::new()),
            fan_out: Mutex::new(()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink. Re-using an id replaces the
    /// previous connection.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    ///
    /// Returns how long the connection was registered, or `None` for an
    /// unknown id.
    pub async fn remove(&self, conn_id: &str) -> Option<chrono::Duration> {
        let conn = self.connections.write().await.remove(conn_id)?;
        Some(chrono::Utc::now() - conn.connected_at)
    }

    /// Handle one inbound text frame from `conn_id`.
    ///
    /// Chat and file frames are stored as a [`ChatMessage`] and broadcast to
    /// every connection, the sender included. Malformed frames are logged and
    /// dropped; frames with an unknown `type` are ignored. Returns the stored
    /// message, if any.
    pub async fn handle_frame(&self, conn_id: &str, raw: &str) -> Option<ChatMessage> {
        let frame = match InboundFrame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(conn_id, error = %e, "Error processing WebSocket message");
                return None;
            }
        };

        let _ordering = self.fan_out.lock().await;

        // Stamped under the lock so timestamps follow store order.
        let Some(message) = frame.into_message() else {
            tracing::debug!(conn_id, "Ignoring WebSocket frame with unknown type");
            return None;
        };

        self.store.create_message(message.clone());

        match message.message_type {
            MessageType::Message => tracing::info!(
                message_id = %message.id,
                user_id = %message.user_id,
                "Chat message received",
            ),
            MessageType::File => tracing::info!(
                message_id = %message.id,
                user_id = %message.user_id,
                file_name = %message.content,
                "File upload message received",
            ),
        }

        match serde_json::to_string(&Envelope::from(&message)) {
            Ok(text) => self.broadcast(Message::Text(text.into())).await,
            Err(e) => {
                tracing::error!(message_id = %message.id, error = %e, "Failed to encode envelope");
            }
        }

        Some(message)
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}
